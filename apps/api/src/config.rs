use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::analysis::comparator::{DifficultyWeights, FitThresholds};
use crate::cache::EvictionPolicy;

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Application configuration loaded from environment variables.
/// Only `ANTHROPIC_API_KEY` switches behaviour; without it the service runs fallback-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub anthropic_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout: Duration,
    /// JD and CV are each truncated to this many characters before prompting.
    pub max_ctx_chars: usize,
    /// Normalized CV text is truncated to this many characters before caching.
    pub max_cv_chars: usize,
    pub max_cached_items: usize,
    pub cache_eviction: EvictionPolicy,
    pub snippet_chars: usize,
    pub max_upload_bytes: usize,
    pub fit_thresholds: FitThresholds,
    pub difficulty_weights: DifficultyWeights,
    /// Share of LLM-claimed skills allowed to be untraceable to the source text.
    pub hallucination_tolerance: f64,
    pub llm_polish: bool,
    pub career_suggestions: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fit_thresholds = FitThresholds {
            strong: parse_or(&lookup, "FIT_STRONG_THRESHOLD", 0.75)?,
            potential: parse_or(&lookup, "FIT_POTENTIAL_THRESHOLD", 0.4)?,
        };
        if !(0.0..=1.0).contains(&fit_thresholds.potential)
            || !(0.0..=1.0).contains(&fit_thresholds.strong)
            || fit_thresholds.potential > fit_thresholds.strong
        {
            bail!(
                "Fit thresholds must satisfy 0 <= FIT_POTENTIAL_THRESHOLD ({}) <= FIT_STRONG_THRESHOLD ({}) <= 1",
                fit_thresholds.potential,
                fit_thresholds.strong
            );
        }

        let hallucination_tolerance: f64 = parse_or(&lookup, "HALLUCINATION_TOLERANCE", 0.0)?;
        if !(0.0..=1.0).contains(&hallucination_tolerance) {
            bail!("HALLUCINATION_TOLERANCE must be within [0, 1], got {hallucination_tolerance}");
        }

        let max_cached_items: usize = parse_or(&lookup, "MAX_CACHED_ITEMS", 200)?;
        if max_cached_items == 0 {
            bail!("MAX_CACHED_ITEMS must be at least 1");
        }

        let cache_eviction = match lookup("CACHE_EVICTION") {
            Some(raw) => raw
                .parse::<EvictionPolicy>()
                .map_err(|e| anyhow::anyhow!(e))
                .context("CACHE_EVICTION must be 'lru' or 'fifo'")?,
            None => EvictionPolicy::default(),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            anthropic_api_key: lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty()),
            llm_model: lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            llm_timeout: Duration::from_secs(parse_or(&lookup, "LLM_TIMEOUT_SECS", 20)?),
            max_ctx_chars: parse_or(&lookup, "MAX_CTX_CHARS", 16_000)?,
            max_cv_chars: parse_or(&lookup, "MAX_CV_CHARS", 12_000)?,
            max_cached_items,
            cache_eviction,
            snippet_chars: parse_or(&lookup, "SNIPPET_CHARS", 1_000)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            fit_thresholds,
            difficulty_weights: DifficultyWeights::default(),
            hallucination_tolerance,
            llm_polish: parse_or(&lookup, "LLM_POLISH", false)?,
            career_suggestions: parse_or(&lookup, "CAREER_SUGGESTIONS", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}
