mod analysis;
mod cache;
mod config;
mod errors;
mod llm_client;
mod models;
mod parser;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::orchestrator::{AnalysisSettings, Analyzer};
use crate::cache::CvCache;
use crate::config::Config;
use crate::llm_client::{LanguageModel, LlmClient};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting skill gap analyzer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (optional: without a key every analysis is deterministic)
    let llm: Option<Arc<dyn LanguageModel>> = match &config.anthropic_api_key {
        Some(key) => {
            let client = LlmClient::new(key.clone(), config.llm_model.clone(), config.llm_timeout)?;
            info!("LLM client initialized (model: {})", config.llm_model);
            Some(Arc::new(client))
        }
        None => {
            warn!("ANTHROPIC_API_KEY not set, running in fallback-only mode");
            None
        }
    };

    // Initialize CV cache
    let cache = Arc::new(CvCache::new(config.max_cached_items, config.cache_eviction));
    info!(
        "CV cache initialized: capacity={} eviction={:?}",
        cache.capacity(),
        config.cache_eviction
    );

    let analyzer = Arc::new(Analyzer::new(llm, AnalysisSettings::from_config(&config)));
    info!(
        "Analyzer ready: llm={} polish={} career_suggestions={}",
        analyzer.llm_enabled(),
        config.llm_polish,
        config.career_suggestions
    );

    // Build app state
    let state = AppState {
        cache,
        analyzer,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
