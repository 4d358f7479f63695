//! Skill Extractor: text → `SkillSet`, LLM first with a deterministic vocabulary fallback.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::analysis::prompts::{extract_skills_prompt, EXTRACT_MAX_TOKENS, EXTRACT_SKILLS_SYSTEM};
use crate::analysis::skills::{is_traceable, term_positions, SkillSet};
use crate::analysis::vocabulary::{canonical_name, VOCABULARY};
use crate::llm_client::prompts::truncate_chars;
use crate::llm_client::{isolate_json, CompletionRequest, LlmError, LlmSession};

/// Accepted shapes of the extraction answer.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtractionPayload {
    Object {
        #[serde(alias = "skill")]
        skills: Vec<String>,
    },
    List(Vec<String>),
}

impl ExtractionPayload {
    fn into_skills(self) -> Vec<String> {
        match self {
            ExtractionPayload::Object { skills } => skills,
            ExtractionPayload::List(skills) => skills,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkillExtractor {
    max_ctx_chars: usize,
}

impl SkillExtractor {
    pub fn new(max_ctx_chars: usize) -> Self {
        Self { max_ctx_chars }
    }

    /// Extracts skills from `text`. Never fails: LLM problems fall through to the
    /// vocabulary matcher, and an empty result is a valid answer.
    pub async fn extract(&self, text: &str, session: &LlmSession) -> SkillSet {
        if text.trim().is_empty() {
            return SkillSet::new();
        }

        if session.is_available() {
            match self.extract_with_llm(text, session).await {
                Ok(skills) => {
                    debug!("LLM extraction returned {} skills", skills.len());
                    return skills;
                }
                Err(e) => warn!(
                    "LLM skill extraction failed ({}), using vocabulary matcher: {e}",
                    e.kind()
                ),
            }
        }

        extract_with_vocabulary(text)
    }

    async fn extract_with_llm(&self, text: &str, session: &LlmSession) -> Result<SkillSet, LlmError> {
        let excerpt = truncate_chars(text, self.max_ctx_chars);
        let prompt = extract_skills_prompt(excerpt);

        let raw = session
            .complete(CompletionRequest {
                prompt: &prompt,
                system: EXTRACT_SKILLS_SYSTEM,
                max_tokens: EXTRACT_MAX_TOKENS,
                temperature: 0.0,
            })
            .await?;

        let payload: ExtractionPayload = match serde_json::from_str(isolate_json(&raw, '{', '}')) {
            Ok(payload) => payload,
            Err(_) => serde_json::from_str(isolate_json(&raw, '[', ']'))?,
        };

        let mut skills = SkillSet::new();
        for name in payload.into_skills() {
            if !is_traceable(&name, text) {
                debug!("Dropping untraceable extracted skill: {name}");
                continue;
            }
            skills.insert(canonical_name(&name).unwrap_or(name.trim()));
        }
        Ok(skills)
    }
}

/// Deterministic extraction: whole-word, case-insensitive matches of vocabulary aliases
/// (exact or with a plural `s`), ordered by first occurrence in the text.
pub fn extract_with_vocabulary(text: &str) -> SkillSet {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut hits: Vec<(usize, &'static str)> = VOCABULARY
        .iter()
        .filter_map(|entry| {
            entry
                .aliases
                .iter()
                .filter_map(|alias| first_mention(&text, alias))
                .min()
                .map(|pos| (pos, entry.canonical))
        })
        .collect();

    hits.sort_by_key(|(pos, _)| *pos);
    hits.into_iter().map(|(_, name)| name).collect()
}

fn first_mention(text: &str, alias: &str) -> Option<usize> {
    let exact = term_positions(text, alias).into_iter().next();
    let plural = if alias.ends_with(|c: char| c.is_ascii_alphabetic() && c != 's') {
        term_positions(text, &format!("{alias}s")).into_iter().next()
    } else {
        None
    };
    match (exact, plural) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}
