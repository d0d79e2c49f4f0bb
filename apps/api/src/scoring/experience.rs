//! Experience extraction and scoring.
//!
//! The JD contributes the *smallest* number of years it mentions (the required threshold);
//! the resume contributes the *largest* (the demonstrated experience).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// "2.5 to 5 years", "3-4.5 year", "3至5年 years"
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(?:to|-|至)\s*([0-9]+(?:\.[0-9]+)?)\s*year")
        .expect("range pattern is valid")
});

// "over 2.5 years", "3+ year", "min 1.5 year"
static SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:over|at least|more than|minimum|min)?\s*([0-9]+(?:\.[0-9]+)?)\s*\+?\s*year")
        .expect("single pattern is valid")
});

/// Experience sub-score reported in the fit result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperienceScore {
    pub required: f64,
    pub found: f64,
    pub score: f64,
}

impl ExperienceScore {
    fn no_requirement() -> Self {
        Self {
            required: 0.0,
            found: 0.0,
            score: 100.0,
        }
    }
}

/// Pools every years-of-experience number mentioned in `text` and returns `(min, max)`,
/// or `(0, 0)` when there are none.
pub fn extract_years_range(text: &str) -> (f64, f64) {
    let text = text.to_lowercase();

    let ranged = RANGE_RE
        .captures_iter(&text)
        .flat_map(|caps| [caps.get(1), caps.get(2)]);
    let single = SINGLE_RE.captures_iter(&text).map(|caps| caps.get(1));

    let numbers: Vec<f64> = ranged
        .chain(single)
        .flatten()
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect();

    if numbers.is_empty() {
        return (0.0, 0.0);
    }

    let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
    let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

/// Scores the resume's demonstrated years against the JD's required years.
///
/// Shortfalls are bucketed by exact value: −1 → 85, −2 → 60, anything else → 40.
/// A fractional shortfall such as −0.5 therefore lands in the 40 bucket.
pub fn score_experience(resume_text: &str, jd_text: &str) -> ExperienceScore {
    let (required, _) = extract_years_range(jd_text);
    if required == 0.0 {
        return ExperienceScore::no_requirement();
    }

    let (_, found) = extract_years_range(resume_text);
    ExperienceScore {
        required,
        found,
        score: shortfall_score(found - required),
    }
}

#[allow(clippy::float_cmp)]
fn shortfall_score(diff: f64) -> f64 {
    if diff >= 0.0 {
        100.0
    } else if diff == -1.0 {
        85.0
    } else if diff == -2.0 {
        60.0
    } else {
        40.0
    }
}
