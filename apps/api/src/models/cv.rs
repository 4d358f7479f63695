use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::llm_client::prompts::truncate_chars;

/// A normalized CV held in the cache. Never mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedCv {
    /// sha256 hex of `text`; identical content always yields the same id.
    pub id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ParsedCv {
    pub fn new(text: String) -> Self {
        Self {
            id: content_id(&text),
            text,
            created_at: Utc::now(),
        }
    }

    pub fn snippet(&self, max_chars: usize) -> &str {
        truncate_chars(&self.text, max_chars)
    }
}

/// Hex-encoded sha256 of `text`.
pub fn content_id(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
