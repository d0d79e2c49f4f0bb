//! Fit Score Aggregator and Batch Processor.
//!
//! overall = round(0.4 × skill + 0.2 × experience + 0.4 × semantic, 2)
//!
//! `FitScorer` owns the skill library; the embedding backend is passed per call so the
//! expensive model stays behind `EmbeddingProvider`.

use std::sync::Arc;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedding::{Embedder, EmbeddingError};
use crate::scoring::experience::{score_experience, ExperienceScore};
use crate::scoring::mandatory_skills::score_mandatory_skills;
use crate::scoring::semantic::semantic_similarity;
use crate::scoring::skill_library::SkillLibrary;

/// Fixed sub-score weights.
pub const SKILL_WEIGHT: f64 = 0.4;
pub const EXPERIENCE_WEIGHT: f64 = 0.2;
pub const SEMANTIC_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitDetails {
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub experience: ExperienceScore,
    pub semantic_score: f64,
}

/// Result of scoring one resume against one JD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitScoreResult {
    pub overall_score: f64,
    pub details: FitDetails,
}

/// Rounds to two decimal places. Exact ties go to the even digit, so `-0.125` becomes `-0.12`.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Weighted overall score. The semantic term is not clamped, so the result can go negative.
pub fn weighted_overall(skill: f64, experience: f64, semantic: f64) -> f64 {
    round2(SKILL_WEIGHT * skill + EXPERIENCE_WEIGHT * experience + SEMANTIC_WEIGHT * semantic)
}

pub struct FitScorer {
    library: Arc<SkillLibrary>,
}

impl FitScorer {
    pub fn new(library: Arc<SkillLibrary>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &SkillLibrary {
        &self.library
    }

    pub fn score_job_fit(
        &self,
        resume_text: &str,
        jd_text: &str,
        embedder: &dyn Embedder,
    ) -> Result<FitScoreResult, EmbeddingError> {
        let skills = score_mandatory_skills(resume_text, jd_text, &self.library);
        let experience = score_experience(resume_text, jd_text);
        let semantic = semantic_similarity(embedder, resume_text, jd_text)?;

        let overall_score = weighted_overall(skills.score, experience.score, semantic);

        debug!(
            overall_score,
            skill_score = skills.score,
            experience_score = experience.score,
            semantic_score = semantic,
            missing = skills.missing.len(),
            "Scored resume"
        );

        Ok(FitScoreResult {
            overall_score,
            details: FitDetails {
                matched_skills: skills.matched,
                missing_skills: skills.missing,
                experience,
                semantic_score: round2(semantic),
            },
        })
    }

    /// Scores each resume in order against `jd_text`. Ids are `resume_<n>`, 1-based.
    /// A failing resume yields an error entry; the rest of the batch is still scored.
    pub fn process_batch(
        &self,
        resumes: &[String],
        jd_text: &str,
        embedder: &dyn Embedder,
    ) -> BatchResults {
        let entries = resumes
            .iter()
            .enumerate()
            .map(|(i, resume)| {
                let id = format!("resume_{}", i + 1);
                let entry = match self.score_job_fit(resume, jd_text, embedder) {
                    Ok(result) => BatchEntry::Scored(result),
                    Err(e) => {
                        warn!(resume_id = %id, error = %e, "Batch item failed");
                        BatchEntry::failed(BatchEntry::SCORING_ERROR, e.to_string())
                    }
                };
                (id, entry)
            })
            .collect();

        BatchResults(entries)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub code: String,
    pub message: String,
}

/// One batch slot: a fit result, or `{"error": {"code", "message"}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Scored(FitScoreResult),
    Failed { error: ItemError },
}

impl BatchEntry {
    pub const SCORING_ERROR: &'static str = "SCORING_ERROR";

    pub fn failed(code: &str, message: impl Into<String>) -> Self {
        BatchEntry::Failed {
            error: ItemError {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn as_scored(&self) -> Option<&FitScoreResult> {
        match self {
            BatchEntry::Scored(result) => Some(result),
            BatchEntry::Failed { .. } => None,
        }
    }
}

/// Batch output in input order. Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResults(pub Vec<(String, BatchEntry)>);

impl BatchResults {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn failed_count(&self) -> usize {
        self.0
            .iter()
            .filter(|(_, entry)| entry.as_scored().is_none())
            .count()
    }
}

impl Serialize for BatchResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, entry) in &self.0 {
            map.serialize_entry(id, entry)?;
        }
        map.end()
    }
}
