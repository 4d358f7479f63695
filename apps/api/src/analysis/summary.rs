//! Human-readable output: recommendation one-liners and the summary paragraph.

use serde_json::json;
use tracing::warn;

use crate::analysis::prompts::{polish_prompt, POLISH_MAX_TOKENS, POLISH_SYSTEM};
use crate::llm_client::{CompletionRequest, LlmSession};
use crate::models::analysis::{AnalysisResult, Improvement};

const SUMMARY_MISSING_LIMIT: usize = 4;
const POLISH_IMPROVEMENT_LIMIT: usize = 3;

/// `Title. Description. CV bullet: …. Resources: a; b; c.` with absent parts skipped.
pub fn format_improvement(item: &Improvement) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(title) = &item.title {
        parts.push(sentence(title));
    }
    if let Some(description) = &item.description {
        parts.push(sentence(description));
    }
    if let Some(bullet) = &item.suggestion {
        parts.push(sentence(&format!("CV bullet: {bullet}")));
    }
    if !item.resources.is_empty() {
        parts.push(sentence(&format!("Resources: {}", item.resources.join("; "))));
    }
    parts.join(" ")
}

pub fn readable_recommendations(items: &[Improvement]) -> Vec<String> {
    items
        .iter()
        .map(format_improvement)
        .filter(|line| !line.is_empty())
        .collect()
}

fn sentence(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

/// Deterministic summary built from the structured fields only.
pub fn templated_summary(result: &AnalysisResult) -> String {
    let pct = (result.suitability.score * 100.0).round() as i64;
    let mut summary = format!("Fit: {} ({pct}%).", result.suitability.label.as_str());

    if result.missing_skills.is_empty() {
        summary.push_str(" No major technical skills appear missing.");
    } else {
        let shown: Vec<&str> = result
            .missing_skills
            .iter()
            .take(SUMMARY_MISSING_LIMIT)
            .map(String::as_str)
            .collect();
        summary.push_str(&format!(" Missing skills: {}", shown.join(", ")));
        let hidden = result.missing_skills.len().saturating_sub(SUMMARY_MISSING_LIMIT);
        if hidden > 0 {
            summary.push_str(&format!(" (+{hidden} more)"));
        }
        summary.push('.');
    }

    if let Some(action) = result
        .suggested_improvements
        .iter()
        .find_map(|item| item.title.as_deref().or(item.description.as_deref()))
    {
        summary.push_str(&format!(" Top action: {}", sentence(action)));
    }

    summary
}

/// Summary paragraph. LLM-written when `use_llm` is set and the session is still usable,
/// templated otherwise or when the polish call fails.
pub async fn summarize(result: &AnalysisResult, session: &LlmSession, use_llm: bool) -> String {
    if use_llm && session.is_available() {
        match polish(result, session).await {
            Some(text) => return text,
            None => warn!("Summary polish failed, using templated summary"),
        }
    }
    templated_summary(result)
}

async fn polish(result: &AnalysisResult, session: &LlmSession) -> Option<String> {
    let facts = json!({
        "fit_label": result.suitability.label,
        "score": result.suitability.score,
        "matched_skills": result.matched_skills,
        "missing_skills": result.missing_skills,
        "difficulty": result.difficulty_estimate.level,
        "top_actions": result
            .suggested_improvements
            .iter()
            .take(POLISH_IMPROVEMENT_LIMIT)
            .filter_map(|item| item.title.as_deref())
            .collect::<Vec<_>>(),
    });
    let prompt = polish_prompt(&facts.to_string());

    let text = session
        .complete(CompletionRequest {
            prompt: &prompt,
            system: POLISH_SYSTEM,
            max_tokens: POLISH_MAX_TOKENS,
            temperature: 0.3,
        })
        .await
        .ok()?;

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}
