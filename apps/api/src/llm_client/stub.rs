//! Scripted `LanguageModel` for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CompletionRequest, LanguageModel, LlmError};

/// Replays queued responses in order. Once the queue is drained every call fails with
/// `Unavailable`. Prompts are recorded so tests can assert on what was sent.
pub struct StubModel {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubModel {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A model that always fails with the given error kind.
    pub fn failing(make_error: fn() -> LlmError, times: usize) -> Self {
        Self::new((0..times).map(|_| Err(make_error())).collect())
    }

    /// A model that sleeps before answering.
    pub fn slow(delay: Duration, answer: &str) -> Self {
        let mut model = Self::new(vec![Ok(answer.to_string())]);
        model.delay = Some(delay);
        model
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(request.prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or(Err(LlmError::Unavailable))
    }
}
