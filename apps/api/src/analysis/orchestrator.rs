//! Analyze Orchestrator.
//!
//! Pipeline per request:
//! 1. One LLM analysis attempt, validated into `LlmOutcome`
//! 2. Success → LLM skill lists, comparator-recomputed gaps, recommender fill-ins
//!    Fallback → extractor on JD and CV, comparator, recommender
//! 3. Best-effort career suggestions, flags, confidence, summary
//!
//! `analyze` never fails. Every LLM problem ends in the deterministic branch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::analysis::comparator::{
    compare, estimate_difficulty, keyword_matches, round2, Comparison, DifficultyWeights,
    FitThresholds,
};
use crate::analysis::extractor::SkillExtractor;
use crate::analysis::llm_analysis::{FallbackReason, ImprovementPayload, LlmAnalyst, LlmOutcome, ValidatedAnalysis};
use crate::analysis::prompts::{career_prompt, CAREER_MAX_TOKENS, CAREER_SYSTEM};
use crate::analysis::recommender::recommend_one;
use crate::analysis::skills::{is_traceable, normalize_key, SkillSet};
use crate::analysis::summary::{readable_recommendations, summarize};
use crate::config::Config;
use crate::llm_client::prompts::truncate_chars;
use crate::llm_client::{isolate_json, CompletionRequest, LanguageModel, LlmSession};
use crate::models::analysis::{
    AnalysisMode, AnalysisResult, Difficulty, FitLabel, Flags, Improvement, ImprovementKind,
    Suitability, Timing,
};

const MAX_CAREER_SUGGESTIONS: usize = 3;
const LOW_CONTENT_CHARS: usize = 200;
const DEFAULT_LLM_CONFIDENCE: f64 = 0.5;
const MALFORMED_JD_CONFIDENCE: f64 = 0.15;

/// Tunables of the analysis pipeline, taken from `Config`.
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub llm_timeout: Duration,
    pub max_ctx_chars: usize,
    pub fit_thresholds: FitThresholds,
    pub difficulty_weights: DifficultyWeights,
    pub hallucination_tolerance: f64,
    pub llm_polish: bool,
    pub career_suggestions: bool,
}

impl AnalysisSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            llm_timeout: config.llm_timeout,
            max_ctx_chars: config.max_ctx_chars,
            fit_thresholds: config.fit_thresholds,
            difficulty_weights: config.difficulty_weights,
            hallucination_tolerance: config.hallucination_tolerance,
            llm_polish: config.llm_polish,
            career_suggestions: config.career_suggestions,
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            llm_timeout: Duration::from_secs(20),
            max_ctx_chars: 16_000,
            fit_thresholds: FitThresholds::default(),
            difficulty_weights: DifficultyWeights::default(),
            hallucination_tolerance: 0.0,
            llm_polish: false,
            career_suggestions: true,
        }
    }
}

/// Skill-gap outcome of either branch, before the shared post-processing.
struct Gap {
    mode: AnalysisMode,
    required: SkillSet,
    candidate: SkillSet,
    comparison: Comparison,
    difficulty: Difficulty,
    improvements: Vec<Improvement>,
    llm_confidence: Option<f64>,
}

pub struct Analyzer {
    llm: Option<Arc<dyn LanguageModel>>,
    settings: AnalysisSettings,
    extractor: SkillExtractor,
    analyst: LlmAnalyst,
}

impl Analyzer {
    pub fn new(llm: Option<Arc<dyn LanguageModel>>, settings: AnalysisSettings) -> Self {
        Self {
            extractor: SkillExtractor::new(settings.max_ctx_chars),
            analyst: LlmAnalyst::new(settings.max_ctx_chars, settings.hallucination_tolerance),
            llm,
            settings,
        }
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn analyze(&self, jd: &str, cv: &str) -> AnalysisResult {
        let started = Instant::now();
        let analyzed_at = Utc::now();
        let session = LlmSession::new(self.llm.clone(), self.settings.llm_timeout);
        let mut flags = Flags::default();

        let mut gap = match self.analyst.attempt(jd, cv, &session).await {
            LlmOutcome::Success(validated) => self.merge_llm(validated),
            LlmOutcome::Fallback(reason) => {
                warn!(
                    "LLM analysis fell back ({}), using deterministic pipeline: {reason}",
                    reason.kind()
                );
                flags.possible_hallucination = matches!(reason, FallbackReason::Hallucination(_));
                self.fallback(jd, cv, &session).await
            }
        };

        if self.settings.career_suggestions && session.is_available() {
            gap.improvements
                .extend(career_suggestions(jd, cv, &session, self.settings.max_ctx_chars).await);
        }

        flags.jd_malformed = gap.required.is_empty();
        flags.cv_low_content = cv.trim().chars().count() < LOW_CONTENT_CHARS;
        if flags.jd_malformed {
            gap.comparison.score = 0.0;
            gap.comparison.label = FitLabel::NotAFit;
        }

        let confidence = if flags.jd_malformed {
            MALFORMED_JD_CONFIDENCE
        } else {
            match gap.mode {
                AnalysisMode::Llm => gap.llm_confidence.unwrap_or(DEFAULT_LLM_CONFIDENCE),
                AnalysisMode::Fallback => 0.6 + 0.4 * gap.comparison.score,
            }
        };

        let mut result = AnalysisResult {
            mode: gap.mode,
            required_skills: gap.required.to_vec(),
            cv_skills: gap.candidate.to_vec(),
            matched_keywords: keyword_matches(&gap.required, jd, cv),
            matched_skills: gap.comparison.matched,
            missing_skills: gap.comparison.missing,
            suitability: Suitability {
                score: gap.comparison.score,
                label: gap.comparison.label,
            },
            difficulty_estimate: gap.difficulty,
            recommendations: readable_recommendations(&gap.improvements),
            suggested_improvements: gap.improvements,
            summary: String::new(),
            confidence: round2(confidence.clamp(0.0, 1.0)),
            flags,
            timing: Timing {
                analyzed_at,
                analysis_ms: 0,
            },
        };

        result.summary = summarize(&result, &session, self.settings.llm_polish).await;
        result.timing.analysis_ms = started.elapsed().as_millis() as u64;

        info!(
            "Analysis complete: mode={:?} required={} missing={} score={:.2} in {}ms",
            result.mode,
            result.required_skills.len(),
            result.missing_skills.len(),
            result.suitability.score,
            result.timing.analysis_ms
        );

        result
    }

    /// LLM branch: skill lists and score from the model, gaps recomputed locally.
    fn merge_llm(&self, validated: ValidatedAnalysis) -> Gap {
        let mut comparison = compare(
            &validated.required_skills,
            &validated.cv_skills,
            &self.settings.fit_thresholds,
        );
        comparison.score = validated.score;
        comparison.label = self.settings.fit_thresholds.label(validated.score);

        let heuristic = estimate_difficulty(&comparison.missing, &self.settings.difficulty_weights);
        let difficulty = match validated.difficulty {
            Some(claimed) => Difficulty {
                score: round2(claimed.score),
                level: self.settings.difficulty_weights.level(claimed.score),
                reason: claimed.reason.unwrap_or(heuristic.reason),
            },
            None => heuristic,
        };

        let mut improvements = validated.improvements;
        let unaddressed: Vec<&String> = comparison
            .missing
            .iter()
            .filter(|skill| !improvements.iter().any(|item| addresses(item, skill)))
            .collect();
        debug!("Recommender fills {} unaddressed missing skills", unaddressed.len());
        let fill_ins: Vec<Improvement> = unaddressed
            .into_iter()
            .map(|skill| Improvement::from(recommend_one(skill)))
            .collect();
        improvements.extend(fill_ins);

        Gap {
            mode: AnalysisMode::Llm,
            required: validated.required_skills,
            candidate: validated.cv_skills,
            comparison,
            difficulty,
            improvements,
            llm_confidence: validated.confidence,
        }
    }

    /// Deterministic branch. The extractor may still use the session if it is available.
    async fn fallback(&self, jd: &str, cv: &str, session: &LlmSession) -> Gap {
        let required = self.extractor.extract(jd, session).await;
        let candidate = self.extractor.extract(cv, session).await;

        let comparison = compare(&required, &candidate, &self.settings.fit_thresholds);
        let difficulty = estimate_difficulty(&comparison.missing, &self.settings.difficulty_weights);
        let improvements = comparison
            .missing
            .iter()
            .map(|skill| Improvement::from(recommend_one(skill)))
            .collect();

        Gap {
            mode: AnalysisMode::Fallback,
            required,
            candidate,
            comparison,
            difficulty,
            improvements,
            llm_confidence: None,
        }
    }
}

/// An improvement addresses a skill when its keyword is that skill, or its title or
/// description mentions it.
fn addresses(item: &Improvement, skill: &str) -> bool {
    if item
        .keyword
        .as_deref()
        .is_some_and(|keyword| normalize_key(keyword) == normalize_key(skill))
    {
        return true;
    }
    [item.title.as_deref(), item.description.as_deref()]
        .into_iter()
        .flatten()
        .any(|text| is_traceable(skill, text))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CareerPayload {
    List(Vec<serde_json::Value>),
    Object {
        #[serde(alias = "suggestions", alias = "recommendations")]
        items: Vec<serde_json::Value>,
    },
}

/// Up to three career suggestions. Best-effort: any failure yields an empty list.
async fn career_suggestions(
    jd: &str,
    cv: &str,
    session: &LlmSession,
    max_ctx_chars: usize,
) -> Vec<Improvement> {
    let prompt = career_prompt(truncate_chars(jd, max_ctx_chars), truncate_chars(cv, max_ctx_chars));
    let raw = match session
        .complete(CompletionRequest {
            prompt: &prompt,
            system: CAREER_SYSTEM,
            max_tokens: CAREER_MAX_TOKENS,
            temperature: 0.2,
        })
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            debug!("Career suggestions skipped ({}): {e}", e.kind());
            return Vec::new();
        }
    };

    let items = match serde_json::from_str::<CareerPayload>(isolate_json(&raw, '[', ']'))
        .or_else(|_| serde_json::from_str::<CareerPayload>(isolate_json(&raw, '{', '}')))
    {
        Ok(CareerPayload::List(items)) | Ok(CareerPayload::Object { items }) => items,
        Err(e) => {
            debug!("Career suggestions unparseable, skipped: {e}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<ImprovementPayload>(item).ok())
        .filter_map(|item| item.into_improvement(ImprovementKind::Career))
        .take(MAX_CAREER_SUGGESTIONS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::stub::StubModel;
    use crate::llm_client::LlmError;

    const JD: &str = "Senior ML engineer. Must have Python, TensorFlow and MLOps experience.";
    const CV: &str = "Data scientist. Python, PyTorch and SQL for five years.";

    fn analyzer(model: Option<Arc<StubModel>>) -> Analyzer {
        let llm = model.map(|m| m as Arc<dyn LanguageModel>);
        Analyzer::new(llm, AnalysisSettings::default())
    }

    fn llm_payload(score: f64) -> String {
        serde_json::json!({
            "required_skills": ["Python", "TensorFlow", "ML Ops"],
            "cv_skills": ["Python", "Pytorch", "SQL"],
            "missing_skills": ["SQL"],
            "suitability": {"score": score, "label": "Not a Fit"},
            "suggested_improvements": [
                {"title": "Ship a TensorFlow model", "description": "Train and export a Keras classifier",
                 "keyword": "TensorFlow", "priority": "high"}
            ],
            "confidence": 0.82
        })
        .to_string()
    }

    fn assert_worked_example_fallback(result: &AnalysisResult) {
        assert_eq!(result.mode, AnalysisMode::Fallback);
        assert_eq!(result.required_skills, vec!["Python", "TensorFlow", "MLOps"]);
        assert_eq!(result.cv_skills, vec!["Python", "PyTorch", "SQL"]);
        assert_eq!(result.matched_skills, vec!["Python"]);
        assert_eq!(result.missing_skills, vec!["TensorFlow", "MLOps"]);
        assert!((result.suitability.score - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(result.suitability.label, FitLabel::NotAFit);

        let keywords: Vec<_> = result
            .suggested_improvements
            .iter()
            .map(|i| i.keyword.as_deref())
            .collect();
        assert_eq!(keywords, vec![Some("TensorFlow"), Some("MLOps")]);
        assert_eq!(result.recommendations.len(), 2);
        assert!(!result.summary.is_empty());
    }

    #[tokio::test]
    async fn test_no_llm_configured_uses_fallback() {
        let result = analyzer(None).analyze(JD, CV).await;

        assert_worked_example_fallback(&result);
        assert_eq!(result.confidence, 0.73);
        assert!(result.flags.cv_low_content);
        assert!(!result.flags.jd_malformed);
        assert!(!result.flags.possible_hallucination);
        assert!(result.summary.starts_with("Fit: Not a Fit (33%). Missing skills: TensorFlow, MLOps."));
    }

    #[tokio::test]
    async fn test_malformed_json_falls_back() {
        let model = Arc::new(StubModel::new(vec![Ok("{\"required_skills\": [oops".to_string())]));
        let result = analyzer(Some(model)).analyze(JD, CV).await;
        assert_worked_example_fallback(&result);
    }

    #[tokio::test]
    async fn test_quota_error_disables_llm_for_the_request() {
        let model = Arc::new(StubModel::failing(|| LlmError::Quota("429".into()), 5));
        let result = analyzer(Some(model.clone())).analyze(JD, CV).await;

        assert_worked_example_fallback(&result);
        assert_eq!(model.calls(), 1, "no further LLM calls after a provider failure");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let model = Arc::new(StubModel::slow(Duration::from_secs(600), &llm_payload(0.9)));
        let result = analyzer(Some(model.clone())).analyze(JD, CV).await;

        assert_worked_example_fallback(&result);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_hallucination_is_flagged_and_falls_back() {
        let payload = serde_json::json!({
            "required_skills": ["Python", "Kubernetes"],
            "cv_skills": ["Python"],
            "missing_skills": ["Kubernetes"],
            "suitability": {"score": 0.5}
        });
        let model = Arc::new(StubModel::new(vec![Ok(payload.to_string())]));
        let result = analyzer(Some(model)).analyze(JD, CV).await;

        assert_worked_example_fallback(&result);
        assert!(result.flags.possible_hallucination);
        assert!(!result.required_skills.contains(&"Kubernetes".to_string()));
    }

    #[tokio::test]
    async fn test_llm_success_recomputes_gaps_and_fills_recommendations() {
        let career = r#"[{"title": "Contribute to an open-source MLOps tool", "description": "Pick a good first issue",
                          "cv_bullet": "Contributed to MLflow", "priority": "medium", "resources": ["mlflow.org"]}]"#;
        let model = Arc::new(StubModel::new(vec![Ok(llm_payload(0.33)), Ok(career.to_string())]));
        let result = analyzer(Some(model.clone())).analyze(JD, CV).await;

        assert_eq!(result.mode, AnalysisMode::Llm);
        assert_eq!(result.matched_skills, vec!["Python"]);
        assert_eq!(result.missing_skills, vec!["TensorFlow", "ML Ops"], "LLM's missing list is ignored");
        assert_eq!(result.suitability.score, 0.33);
        assert_eq!(result.confidence, 0.82);

        let kinds: Vec<_> = result.suggested_improvements.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ImprovementKind::Suggestion,
                ImprovementKind::Recommendation,
                ImprovementKind::Career
            ]
        );
        assert_eq!(result.suggested_improvements[1].keyword.as_deref(), Some("ML Ops"));
        assert_eq!(result.recommendations.len(), 3);
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn test_label_always_follows_score() {
        // The payload claims "Not a Fit"; the label is derived from the score instead.
        let model = Arc::new(StubModel::new(vec![Ok(llm_payload(0.5))]));
        let result = analyzer(Some(model)).analyze(JD, CV).await;
        assert_eq!(result.mode, AnalysisMode::Llm);
        assert_eq!(result.suitability.label, FitLabel::PotentialFit);
    }

    #[tokio::test]
    async fn test_perfect_score_with_missing_skills_falls_back() {
        let payload = serde_json::json!({
            "required_skills": ["Python", "TensorFlow", "MLOps"],
            "cv_skills": ["Python", "PyTorch", "SQL"],
            "missing_skills": [],
            "suitability": {"score": 1.0, "label": "Strong Fit"}
        });
        let model = Arc::new(StubModel::new(vec![Ok(payload.to_string())]));
        let result = analyzer(Some(model)).analyze(JD, CV).await;

        assert_worked_example_fallback(&result);
        assert!(!result.flags.possible_hallucination);
    }

    #[tokio::test]
    async fn test_empty_required_skills_force_zero_score() {
        let payload = serde_json::json!({
            "required_skills": [],
            "cv_skills": ["Python"],
            "missing_skills": [],
            "suitability": {"score": 0.9, "label": "Strong Fit"}
        });
        let model = Arc::new(StubModel::new(vec![Ok(payload.to_string())]));
        let result = analyzer(Some(model)).analyze(JD, CV).await;

        assert_eq!(result.mode, AnalysisMode::Llm);
        assert!(result.flags.jd_malformed);
        assert_eq!(result.suitability.score, 0.0);
        assert_eq!(result.suitability.label, FitLabel::NotAFit);
        assert_eq!(result.confidence, 0.15);
    }

    #[tokio::test]
    async fn test_non_technical_jd_is_flagged() {
        let result = analyzer(None)
            .analyze("Friendly barista wanted for weekend shifts.", CV)
            .await;

        assert!(result.flags.jd_malformed);
        assert!(result.required_skills.is_empty());
        assert_eq!(result.suitability.score, 0.0);
        assert_eq!(result.confidence, 0.15);
        assert!(result.suggested_improvements.is_empty());
        assert!(result.summary.contains("No major technical skills appear missing."));
    }

    #[tokio::test]
    async fn test_polish_writes_summary_when_enabled() {
        let model = Arc::new(StubModel::new(vec![
            Ok(llm_payload(0.5)),
            Ok("[]".to_string()),
            Ok("You are close: learn TensorFlow first.".to_string()),
        ]));
        let settings = AnalysisSettings {
            llm_polish: true,
            ..AnalysisSettings::default()
        };
        let result = Analyzer::new(Some(model as Arc<dyn LanguageModel>), settings)
            .analyze(JD, CV)
            .await;
        assert_eq!(result.summary, "You are close: learn TensorFlow first.");
    }

    #[test]
    fn test_addresses_by_keyword_or_mention() {
        let item: Improvement = recommend_one("k8s").into();
        assert!(addresses(&item, "Kubernetes"));

        let mut mention = item.clone();
        mention.keyword = None;
        mention.title = Some("Deploy to AWS Lambda".into());
        assert!(addresses(&mention, "aws"));
        assert!(!addresses(&mention, "Docker"));
    }
}
