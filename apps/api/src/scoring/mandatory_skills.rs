//! Mandatory-Skill Scorer: checks that the resume covers the skills a JD flags as mandatory.
//!
//! Algorithm:
//! 1. Keep JD lines containing a mandatory cue ("must have", "required", "mandatory", "essential").
//! 2. Tokenize those lines and keep only tokens the skill library recognizes.
//! 3. A category requirement matches on the category name or any of its synonyms;
//!    a synonym requirement matches only on the literal token.
//! 4. score = 100 × matched / targeted, then: one miss → −15, two or more → capped at 50.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::scoring::skill_library::SkillLibrary;
use crate::scoring::tokenizer::tokenize;

const MANDATORY_CUES: &[&str] = &["must have", "required", "mandatory", "essential"];

const SINGLE_MISS_PENALTY: f64 = 15.0;
const MULTI_MISS_CAP: f64 = 50.0;

/// Skill coverage of one resume against one JD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub score: f64,
    /// Sorted ascending.
    pub matched: Vec<String>,
    /// Sorted ascending.
    pub missing: Vec<String>,
}

impl SkillMatch {
    /// Nothing enforceable in the JD: a trivial pass.
    fn no_requirements() -> Self {
        Self {
            score: 100.0,
            matched: vec![],
            missing: vec![],
        }
    }
}

/// Mandatory skill terms of `jd_text` that the library recognizes.
pub fn targeted_requirements(jd_text: &str, library: &SkillLibrary) -> BTreeSet<String> {
    jd_text
        .to_lowercase()
        .split('\n')
        .filter(|line| MANDATORY_CUES.iter().any(|cue| line.contains(cue)))
        .flat_map(tokenize)
        .filter(|token| library.recognizes(token))
        .collect()
}

pub fn score_mandatory_skills(
    resume_text: &str,
    jd_text: &str,
    library: &SkillLibrary,
) -> SkillMatch {
    let targeted = targeted_requirements(jd_text, library);
    if targeted.is_empty() {
        return SkillMatch::no_requirements();
    }

    let resume_tokens = tokenize(resume_text);
    let (matched, missing): (Vec<String>, Vec<String>) = targeted
        .iter()
        .cloned()
        .partition(|requirement| is_covered(requirement, &resume_tokens, library));

    let base = matched.len() as f64 / targeted.len() as f64 * 100.0;
    let score = apply_missing_penalty(base, missing.len());

    SkillMatch {
        score,
        matched,
        missing,
    }
}

fn is_covered(requirement: &str, resume_tokens: &HashSet<String>, library: &SkillLibrary) -> bool {
    match library.synonyms(requirement) {
        Some(synonyms) => {
            resume_tokens.contains(requirement)
                || synonyms.iter().any(|s| resume_tokens.contains(s))
        }
        None => resume_tokens.contains(requirement),
    }
}

fn apply_missing_penalty(base: f64, missing: usize) -> f64 {
    let penalized = match missing {
        0 => base,
        1 => base - SINGLE_MISS_PENALTY,
        _ => base.min(MULTI_MISS_CAP),
    };
    penalized.max(0.0)
}
