//! Comparator: deterministic set comparison between required and candidate skills.
//!
//! Algorithm:
//! 1. matched = required ∩ candidate, missing = required − candidate (normalized keys,
//!    required's order and display names)
//! 2. score = |matched| / |required|, or 0.0 when nothing is required
//! 3. label bucketed from score by `FitThresholds`
//!
//! Also hosts the difficulty heuristic and keyword occurrence statistics.

use serde::{Deserialize, Serialize};

use crate::analysis::skills::{contexts, count_occurrences, normalize_key, SkillSet};
use crate::models::analysis::{Difficulty, DifficultyLevel, FitLabel, KeywordMatch};

const CONTEXT_RADIUS: usize = 40;
const MAX_CONTEXTS: usize = 2;

/// Skills whose absence makes a transition noticeably harder.
const INFRA_SKILLS: &[&str] = &[
    "docker",
    "kubernetes",
    "aws",
    "gcp",
    "azure",
    "ci/cd",
    "terraform",
    "mlops",
];

/// Score cut-offs for the fit label. Inclusive lower bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitThresholds {
    pub strong: f64,
    pub potential: f64,
}

impl Default for FitThresholds {
    fn default() -> Self {
        Self {
            strong: 0.75,
            potential: 0.4,
        }
    }
}

impl FitThresholds {
    pub fn label(&self, score: f64) -> FitLabel {
        if score >= self.strong {
            FitLabel::StrongFit
        } else if score >= self.potential {
            FitLabel::PotentialFit
        } else {
            FitLabel::NotAFit
        }
    }
}

/// Weights of the difficulty heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyWeights {
    /// Added per missing skill.
    pub per_missing: f64,
    /// Added on top for each missing infrastructure skill.
    pub infra_bonus: f64,
    /// Scores below this are `Low`.
    pub moderate_from: f64,
    /// Scores at or above this are `High`.
    pub high_from: f64,
}

impl Default for DifficultyWeights {
    fn default() -> Self {
        Self {
            per_missing: 0.15,
            infra_bonus: 0.1,
            moderate_from: 0.35,
            high_from: 0.7,
        }
    }
}

impl DifficultyWeights {
    pub fn level(&self, score: f64) -> DifficultyLevel {
        if score >= self.high_from {
            DifficultyLevel::High
        } else if score >= self.moderate_from {
            DifficultyLevel::Moderate
        } else {
            DifficultyLevel::Low
        }
    }
}

/// Output of `compare`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub score: f64,
    pub label: FitLabel,
}

pub fn compare(required: &SkillSet, candidate: &SkillSet, thresholds: &FitThresholds) -> Comparison {
    let (matched, missing): (Vec<(&str, &str)>, Vec<(&str, &str)>) = required
        .entries()
        .partition(|(_, key)| candidate.contains_key(key));

    let matched: Vec<String> = matched.into_iter().map(|(name, _)| name.to_string()).collect();
    let missing: Vec<String> = missing.into_iter().map(|(name, _)| name.to_string()).collect();

    let score = if required.is_empty() {
        0.0
    } else {
        matched.len() as f64 / required.len() as f64
    };

    Comparison {
        label: thresholds.label(score),
        matched,
        missing,
        score,
    }
}

/// Heuristic effort estimate for closing the gap, from the count and kind of missing skills.
pub fn estimate_difficulty(missing: &[String], weights: &DifficultyWeights) -> Difficulty {
    let infra_missing: Vec<&str> = missing
        .iter()
        .filter(|skill| INFRA_SKILLS.contains(&normalize_key(skill).as_str()))
        .map(String::as_str)
        .collect();

    let score = (weights.per_missing * missing.len() as f64
        + weights.infra_bonus * infra_missing.len() as f64)
        .clamp(0.0, 1.0);

    let reason = if missing.is_empty() {
        "No major missing skills".to_string()
    } else if infra_missing.is_empty() {
        format!("Missing skills: {}", missing.join(", "))
    } else {
        format!(
            "Missing skills: {} (infra/cloud: {})",
            missing.join(", "),
            infra_missing.join(", ")
        )
    };

    Difficulty {
        score: round2(score),
        level: weights.level(score),
        reason,
    }
}

/// Occurrence statistics for each required skill mentioned in either text.
pub fn keyword_matches(required: &SkillSet, jd_text: &str, cv_text: &str) -> Vec<KeywordMatch> {
    required
        .iter()
        .filter_map(|skill| {
            let occurrences_in_jd = count_occurrences(jd_text, skill);
            let occurrences_in_cv = count_occurrences(cv_text, skill);
            if occurrences_in_jd == 0 && occurrences_in_cv == 0 {
                return None;
            }
            Some(KeywordMatch {
                keyword: skill.to_string(),
                occurrences_in_jd,
                occurrences_in_cv,
                context_jd: contexts(jd_text, skill, CONTEXT_RADIUS, MAX_CONTEXTS),
            })
        })
        .collect()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
