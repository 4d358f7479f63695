use std::sync::Arc;

use crate::analysis::orchestrator::Analyzer;
use crate::cache::CvCache;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Parsed CVs by content id. The only shared mutable state in the service.
    pub cache: Arc<CvCache>,
    pub analyzer: Arc<Analyzer>,
    pub config: Config,
}
