use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucketed suitability. Ordered from worst to best so labels compare like scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FitLabel {
    #[serde(rename = "Not a Fit")]
    NotAFit,
    #[serde(rename = "Potential Fit")]
    PotentialFit,
    #[serde(rename = "Strong Fit")]
    StrongFit,
}

impl FitLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitLabel::NotAFit => "Not a Fit",
            FitLabel::PotentialFit => "Potential Fit",
            FitLabel::StrongFit => "Strong Fit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Suitability {
    /// Always within [0, 1].
    pub score: f64,
    pub label: FitLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Low,
    Moderate,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub score: f64,
    pub level: DifficultyLevel,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub keyword: String,
    pub occurrences_in_jd: usize,
    pub occurrences_in_cv: usize,
    pub context_jd: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Lenient parse for model output; unknown values become `Medium`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("high") => Priority::High,
            Some("low") => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImprovementKind {
    /// Suggested by the analysis model.
    Suggestion,
    /// Deterministic recommender entry for a missing skill.
    Recommendation,
    /// Career-move suggestion.
    Career,
}

/// A single actionable item shown to the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    #[serde(rename = "type")]
    pub kind: ImprovementKind,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Missing skill this item addresses, when it targets one.
    pub keyword: Option<String>,
    /// CV bullet the candidate could add.
    pub suggestion: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flags {
    pub jd_malformed: bool,
    pub cv_low_content: bool,
    pub possible_hallucination: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub analyzed_at: DateTime<Utc>,
    pub analysis_ms: u64,
}

/// Which path produced the structured fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    Llm,
    Fallback,
}

/// The unified analysis response. Rebuilt from scratch on every request.
///
/// Invariant: `missing_skills = required_skills − cv_skills` and
/// `matched_skills = required_skills ∩ cv_skills` on normalized skill keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub mode: AnalysisMode,
    pub required_skills: Vec<String>,
    pub cv_skills: Vec<String>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub matched_keywords: Vec<KeywordMatch>,
    pub suitability: Suitability,
    pub difficulty_estimate: Difficulty,
    pub suggested_improvements: Vec<Improvement>,
    /// Human-readable one-liners, one per improvement.
    pub recommendations: Vec<String>,
    pub summary: String,
    pub confidence: f64,
    pub flags: Flags,
    pub timing: Timing,
}

/// Deterministic suggestion for one missing skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub skill: String,
    pub project_idea: String,
    pub cv_bullet: String,
    pub resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_label_serializes_human_readable() {
        assert_eq!(serde_json::to_string(&FitLabel::NotAFit).unwrap(), "\"Not a Fit\"");
        let label: FitLabel = serde_json::from_str("\"Strong Fit\"").unwrap();
        assert_eq!(label, FitLabel::StrongFit);
        assert_eq!(FitLabel::PotentialFit.as_str(), "Potential Fit");
    }

    #[test]
    fn test_fit_label_ordering() {
        assert!(FitLabel::NotAFit < FitLabel::PotentialFit);
        assert!(FitLabel::PotentialFit < FitLabel::StrongFit);
    }

    #[test]
    fn test_priority_parse_lenient() {
        assert_eq!(Priority::parse_lenient(Some(" HIGH ")), Priority::High);
        assert_eq!(Priority::parse_lenient(Some("low")), Priority::Low);
        assert_eq!(Priority::parse_lenient(Some("urgent")), Priority::Medium);
        assert_eq!(Priority::parse_lenient(None), Priority::Medium);
    }

    #[test]
    fn test_improvement_kind_field_is_named_type() {
        let item = Improvement {
            kind: ImprovementKind::Recommendation,
            title: Some("Build a TensorFlow classifier".into()),
            description: None,
            keyword: Some("TensorFlow".into()),
            suggestion: None,
            priority: Priority::High,
            resources: vec![],
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "recommendation");
        assert_eq!(json["priority"], "high");
    }
}
