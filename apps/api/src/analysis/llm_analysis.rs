//! LLM analysis attempt: prompt → raw text → strict payload → validated analysis.
//!
//! Anything short of a fully validated payload becomes a `FallbackReason`; no partially
//! populated analysis ever leaves this module.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::prompts::{analyze_prompt, ANALYZE_MAX_TOKENS, ANALYZE_SYSTEM};
use crate::analysis::skills::{is_traceable, SkillSet};
use crate::llm_client::prompts::truncate_chars;
use crate::llm_client::{isolate_json, CompletionRequest, LlmError, LlmSession};
use crate::models::analysis::{Improvement, ImprovementKind, Priority};

// ────────────────────────────────────────────────────────────────────────────
// Wire payload
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    required_skills: Vec<String>,
    cv_skills: Vec<String>,
    missing_skills: Vec<String>,
    suitability: SuitabilityPayload,
    #[serde(default)]
    difficulty_estimate: Option<DifficultyPayload>,
    /// Items are converted one by one; a malformed item is dropped, not fatal.
    #[serde(default)]
    suggested_improvements: Vec<Value>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SuitabilityPayload {
    score: f64,
}

#[derive(Debug, Deserialize)]
struct DifficultyPayload {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

/// Shared by the analysis and career prompts.
#[derive(Debug, Deserialize)]
pub(crate) struct ImprovementPayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default, alias = "cv_bullet")]
    suggestion: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    resources: Vec<String>,
}

impl ImprovementPayload {
    /// `None` when the item carries neither a title nor a description.
    pub(crate) fn into_improvement(self, kind: ImprovementKind) -> Option<Improvement> {
        let title = non_blank(self.title);
        let description = non_blank(self.description);
        if title.is_none() && description.is_none() {
            return None;
        }
        Some(Improvement {
            kind,
            title,
            description,
            keyword: non_blank(self.keyword),
            suggestion: non_blank(self.suggestion),
            priority: Priority::parse_lenient(self.priority.as_deref()),
            resources: self
                .resources
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome types
// ────────────────────────────────────────────────────────────────────────────

/// Difficulty as claimed by the model. The level is derived later from configured weights.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedDifficulty {
    pub score: f64,
    pub reason: Option<String>,
}

/// LLM output that passed every check of the validation gate.
#[derive(Debug, Clone)]
pub struct ValidatedAnalysis {
    pub required_skills: SkillSet,
    pub cv_skills: SkillSet,
    pub score: f64,
    pub difficulty: Option<ClaimedDifficulty>,
    pub improvements: Vec<Improvement>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Error)]
pub enum FallbackReason {
    #[error("LLM not configured or disabled for this request")]
    Unavailable,

    #[error(transparent)]
    Llm(LlmError),

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("schema violation: {0}")]
    Schema(String),

    #[error("untraceable skills: {}", .0.join(", "))]
    Hallucination(Vec<String>),
}

impl FallbackReason {
    /// Failure class, for logs only.
    pub fn kind(&self) -> &'static str {
        match self {
            FallbackReason::Unavailable => "unavailable",
            FallbackReason::Llm(e) => e.kind(),
            FallbackReason::MalformedJson(_) => "malformed_json",
            FallbackReason::Schema(_) => "schema",
            FallbackReason::Hallucination(_) => "hallucination",
        }
    }
}

impl From<LlmError> for FallbackReason {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Unavailable => FallbackReason::Unavailable,
            LlmError::Parse(e) => FallbackReason::MalformedJson(e.to_string()),
            other => FallbackReason::Llm(other),
        }
    }
}

#[derive(Debug)]
pub enum LlmOutcome {
    Success(ValidatedAnalysis),
    Fallback(FallbackReason),
}

// ────────────────────────────────────────────────────────────────────────────
// Attempt + validation gate
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct LlmAnalyst {
    max_ctx_chars: usize,
    hallucination_tolerance: f64,
}

impl LlmAnalyst {
    pub fn new(max_ctx_chars: usize, hallucination_tolerance: f64) -> Self {
        Self {
            max_ctx_chars,
            hallucination_tolerance,
        }
    }

    /// One analysis call. Never retried; every failure is folded into `Fallback`.
    pub async fn attempt(&self, jd: &str, cv: &str, session: &LlmSession) -> LlmOutcome {
        if !session.is_available() {
            return LlmOutcome::Fallback(FallbackReason::Unavailable);
        }

        let prompt = analyze_prompt(
            truncate_chars(jd, self.max_ctx_chars),
            truncate_chars(cv, self.max_ctx_chars),
        );

        let raw = match session
            .complete(CompletionRequest {
                prompt: &prompt,
                system: ANALYZE_SYSTEM,
                max_tokens: ANALYZE_MAX_TOKENS,
                temperature: 0.0,
            })
            .await
        {
            Ok(raw) => raw,
            Err(e) => return LlmOutcome::Fallback(e.into()),
        };

        match self.validate(&raw, jd, cv) {
            Ok(analysis) => {
                info!(
                    "LLM analysis accepted: required={} cv={} score={:.2}",
                    analysis.required_skills.len(),
                    analysis.cv_skills.len(),
                    analysis.score
                );
                LlmOutcome::Success(analysis)
            }
            Err(reason) => LlmOutcome::Fallback(reason),
        }
    }

    /// The validation gate. `jd` and `cv` are the full source texts used for tracing.
    pub fn validate(&self, raw: &str, jd: &str, cv: &str) -> Result<ValidatedAnalysis, FallbackReason> {
        let value: Value = serde_json::from_str(isolate_json(raw, '{', '}'))
            .map_err(|e| FallbackReason::MalformedJson(e.to_string()))?;
        if !value.is_object() {
            return Err(FallbackReason::MalformedJson("top-level value is not an object".into()));
        }

        let payload: AnalysisPayload =
            serde_json::from_value(value).map_err(|e| FallbackReason::Schema(e.to_string()))?;

        let score = payload.suitability.score;
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(FallbackReason::Schema(format!(
                "suitability.score {score} outside [0, 1]"
            )));
        }

        let (required_skills, untraceable_required) = trace_skills(&payload.required_skills, jd);
        let (cv_skills, untraceable_cv) = trace_skills(&payload.cv_skills, cv);

        let untraceable: Vec<String> = untraceable_required.into_iter().chain(untraceable_cv).collect();
        if !untraceable.is_empty() {
            let total = required_skills.len() + cv_skills.len() + untraceable.len();
            let share = untraceable.len() as f64 / total as f64;
            if share > self.hallucination_tolerance {
                return Err(FallbackReason::Hallucination(untraceable));
            }
            debug!(
                "Dropping {} untraceable skills within tolerance ({share:.2} <= {:.2})",
                untraceable.len(),
                self.hallucination_tolerance
            );
        }

        // A perfect score and a closed gap must agree.
        let gap_closed = !required_skills.is_empty()
            && required_skills.iter().all(|skill| cv_skills.contains(skill));
        if (score == 1.0) != gap_closed {
            return Err(FallbackReason::Schema(format!(
                "suitability.score {score} contradicts the skill lists (gap closed: {gap_closed})"
            )));
        }

        debug!("LLM claimed missing skills: {:?}", payload.missing_skills);

        let difficulty = payload
            .difficulty_estimate
            .and_then(|d| match d.score {
                Some(score) if score.is_finite() => Some(ClaimedDifficulty {
                    score: score.clamp(0.0, 1.0),
                    reason: non_blank(d.reason),
                }),
                _ => None,
            });

        let improvements = payload
            .suggested_improvements
            .into_iter()
            .filter_map(|item| serde_json::from_value::<ImprovementPayload>(item).ok())
            .filter_map(|item| item.into_improvement(ImprovementKind::Suggestion))
            .collect();

        Ok(ValidatedAnalysis {
            required_skills,
            cv_skills,
            score,
            difficulty,
            improvements,
            confidence: payload
                .confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0)),
        })
    }
}

/// Splits claimed skills into those traceable to `source` and those that are not.
/// Blank names are ignored.
fn trace_skills(claimed: &[String], source: &str) -> (SkillSet, Vec<String>) {
    let mut traced = SkillSet::new();
    let mut untraceable = Vec::new();
    for name in claimed.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if is_traceable(name, source) {
            traced.insert(name);
        } else {
            untraceable.push(name.to_string());
        }
    }
    (traced, untraceable)
}
