//! LLM Client: the single point of entry for all model calls in the analyzer.
//!
//! ARCHITECTURAL RULE: analysis code talks to `dyn LanguageModel` only, always through an
//! `LlmSession` so every call is bounded by the configured timeout.
//!
//! No retries: a failed call is reported once and the caller switches to its fallback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;
#[cfg(test)]
pub mod stub;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Quota exhausted or rate limited: {0}")]
    Quota(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM capability is not available")]
    Unavailable,
}

impl LlmError {
    /// Short classification used in logs. Control flow never branches on it.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Http(e) if e.is_timeout() => "timeout",
            LlmError::Http(_) => "network",
            LlmError::Timeout(_) => "timeout",
            LlmError::Quota(_) => "quota",
            LlmError::Auth(_) => "auth",
            LlmError::Api { .. } => "api",
            LlmError::Parse(_) => "malformed_json",
            LlmError::EmptyContent => "empty",
            LlmError::Unavailable => "unavailable",
        }
    }

    /// True when the provider itself failed, as opposed to returning unusable text.
    pub fn is_provider_failure(&self) -> bool {
        !matches!(self, LlmError::Parse(_))
    }
}

/// A single prompt sent to the model.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub system: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// The external LLM capability. Returns the raw text of the first completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Per-request session
// ────────────────────────────────────────────────────────────────────────────

/// LLM access scoped to one analyze request.
///
/// Every call is wrapped in a timeout. After the first provider-level failure the
/// session is marked unavailable and later calls short-circuit with `Unavailable`.
pub struct LlmSession {
    model: Option<Arc<dyn LanguageModel>>,
    timeout: Duration,
    unavailable: AtomicBool,
}

impl LlmSession {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, timeout: Duration) -> Self {
        Self {
            model,
            timeout,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some() && !self.unavailable.load(Ordering::Relaxed)
    }

    pub fn mark_unavailable(&self) {
        self.unavailable.store(true, Ordering::Relaxed);
    }

    pub async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let model = match &self.model {
            Some(model) if self.is_available() => model,
            _ => return Err(LlmError::Unavailable),
        };

        info!(
            "LLM call via {}: prompt_len={}",
            model.name(),
            request.prompt.len()
        );

        let result = match tokio::time::timeout(self.timeout, model.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout)),
        };

        match result {
            Ok(text) if text.trim().is_empty() => {
                self.mark_unavailable();
                Err(LlmError::EmptyContent)
            }
            Ok(text) => Ok(text),
            Err(e) => {
                if e.is_provider_failure() {
                    warn!("LLM provider failure ({}), disabling LLM for this request: {e}", e.kind());
                    self.mark_unavailable();
                }
                Err(e)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic Messages API adapter
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Default `LanguageModel` backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(classify_status(status.as_u16(), message));
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        llm_response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

fn classify_status(status: u16, message: String) -> LlmError {
    match status {
        401 | 403 => LlmError::Auth(message),
        429 | 529 => LlmError::Quota(message),
        _ => LlmError::Api { status, message },
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns the outermost `open ... close` span of `text`, or the whole text when absent.
/// Models sometimes wrap the JSON payload in a sentence.
pub fn isolate_json(text: &str, open: char, close: char) -> &str {
    let text = strip_json_fences(text);
    match (text.find(open), text.rfind(close)) {
        (Some(first), Some(last)) if last > first => &text[first..=last],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::stub::StubModel;
    use super::*;

    fn request() -> CompletionRequest<'static> {
        CompletionRequest {
            prompt: "hello",
            system: prompts::JSON_ONLY_SYSTEM,
            max_tokens: 16,
            temperature: 0.0,
        }
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_isolate_json_drops_surrounding_prose() {
        let input = "Sure! Here is the result: {\"a\": [1, 2]} Hope it helps.";
        assert_eq!(isolate_json(input, '{', '}'), "{\"a\": [1, 2]}");
        assert_eq!(isolate_json("skills: [\"Rust\"]", '[', ']'), "[\"Rust\"]");
        assert_eq!(isolate_json("no json here", '{', '}'), "no json here");
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(401, String::new()).kind(), "auth");
        assert_eq!(classify_status(403, String::new()).kind(), "auth");
        assert_eq!(classify_status(429, String::new()).kind(), "quota");
        assert_eq!(classify_status(500, String::new()).kind(), "api");
    }

    #[tokio::test]
    async fn test_session_without_model_is_unavailable() {
        let session = LlmSession::new(None, Duration::from_secs(1));
        assert!(!session.is_available());
        let err = session.complete(request()).await.unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }

    #[tokio::test]
    async fn test_session_returns_model_text() {
        let model = Arc::new(StubModel::new(vec![Ok("{}".to_string())]));
        let session = LlmSession::new(Some(model.clone()), Duration::from_secs(1));
        assert_eq!(session.complete(request()).await.unwrap(), "{}");
        assert!(session.is_available());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_disables_session() {
        let model = Arc::new(StubModel::new(vec![
            Err(LlmError::Quota("daily limit".into())),
            Ok("never reached".to_string()),
        ]));
        let session = LlmSession::new(Some(model.clone()), Duration::from_secs(1));

        let err = session.complete(request()).await.unwrap_err();
        assert_eq!(err.kind(), "quota");
        assert!(!session.is_available());

        let err = session.complete(request()).await.unwrap_err();
        assert_eq!(err.kind(), "unavailable");
        assert_eq!(model.calls(), 1, "disabled session must not call the model");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_model_times_out() {
        let model = Arc::new(StubModel::slow(Duration::from_secs(60), "{}"));
        let session = LlmSession::new(Some(model), Duration::from_secs(2));
        let err = session.complete(request()).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
        assert!(!session.is_available());
    }

    #[tokio::test]
    async fn test_blank_completion_is_empty_content() {
        let model = Arc::new(StubModel::new(vec![Ok("   ".to_string())]));
        let session = LlmSession::new(Some(model), Duration::from_secs(1));
        let err = session.complete(request()).await.unwrap_err();
        assert_eq!(err.kind(), "empty");
    }
}
