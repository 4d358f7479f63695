pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/health", get(health::health_handler))
        // CV upload
        .route("/api/v1/upload-cv", post(handlers::handle_upload_cv))
        // Analysis
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route("/api/v1/analyze-form", post(handlers::handle_analyze_form))
        .route("/api/v1/recommend", post(handlers::handle_recommend))
        .layer(body_limit)
        .with_state(state)
}
