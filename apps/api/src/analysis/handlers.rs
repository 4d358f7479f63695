//! Axum route handlers for the CV upload and analysis API.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::recommender::recommend;
use crate::cache::InsertOutcome;
use crate::errors::AppError;
use crate::llm_client::prompts::truncate_chars;
use crate::models::analysis::{AnalysisResult, Recommendation};
use crate::models::cv::content_id;
use crate::parser::{self, DocumentKind};
use crate::state::AppState;

const RESPONSE_SNIPPET_CHARS: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub cv_id: String,
    pub snippet: String,
    /// True when identical content was already cached.
    pub cached: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub cv_id: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub job_id: String,
    pub cv_id: String,
    pub jd_text_snippet: String,
    pub cv_text_snippet: String,
    #[serde(flatten)]
    pub result: AnalysisResult,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/upload-cv
///
/// Parses the multipart `file` field and caches the normalized text under its content id.
/// Re-uploading identical content returns the same id with `cached: true`.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        upload = Some((file_name, content_type, bytes));
        break;
    }

    let (file_name, content_type, bytes) = upload
        .ok_or_else(|| AppError::Validation("multipart field 'file' is required".to_string()))?;

    let kind = DocumentKind::detect(file_name.as_deref(), content_type.as_deref())?;
    let byte_len = bytes.len();
    let max_chars = state.config.max_cv_chars;

    // Format libraries are CPU-bound and may panic on hostile input.
    let parsed = tokio::task::spawn_blocking(move || parser::parse(&bytes, kind, max_chars))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("document parser crashed: {e}")))??;

    let parsed = Arc::new(parsed);
    let cached = state.cache.insert(parsed.id.clone(), parsed.clone()) == InsertOutcome::AlreadyPresent;

    info!(
        "CV uploaded: file={} bytes={byte_len} id={} cached={cached}",
        file_name.as_deref().unwrap_or("<unnamed>"),
        parsed.id
    );

    Ok(Json(UploadResponse {
        cv_id: parsed.id.clone(),
        snippet: parsed.snippet(state.config.snippet_chars).to_string(),
        cached,
    }))
}

/// POST /api/v1/analyze
///
/// JSON body `{job_description, cv_id}`. LLM problems never fail the request.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(request) = payload?;
    run_analysis(&state, request).await.map(Json)
}

/// POST /api/v1/analyze-form
///
/// Same as `/analyze`, with `job_description` and `cv_id` as multipart form fields.
pub async fn handle_analyze_form(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut request = AnalyzeRequest::default();
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("job_description") => request.job_description = field.text().await?,
            Some("cv_id") => request.cv_id = field.text().await?,
            _ => {}
        }
    }
    run_analysis(&state, request).await.map(Json)
}

/// POST /api/v1/recommend
///
/// Deterministic recommendations for an explicit list of missing skills.
pub async fn handle_recommend(
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, AppError> {
    let Json(request) = payload?;
    Ok(Json(RecommendResponse {
        recommendations: recommend(&request.missing_skills),
    }))
}

async fn run_analysis(state: &AppState, request: AnalyzeRequest) -> Result<AnalyzeResponse, AppError> {
    let jd = request.job_description.trim();
    if jd.is_empty() {
        return Err(AppError::Validation("job_description cannot be empty".to_string()));
    }
    let cv_id = request.cv_id.trim().to_string();
    if cv_id.is_empty() {
        return Err(AppError::Validation("cv_id is required".to_string()));
    }

    let cv = state
        .cache
        .get(&cv_id)
        .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found; upload it first")))?;

    info!("Analyzing cv_id={cv_id} jd_len={}", jd.len());
    let result = state.analyzer.analyze(jd, &cv.text).await;

    Ok(AnalyzeResponse {
        job_id: content_id(jd),
        cv_id: cv.id.clone(),
        jd_text_snippet: truncate_chars(jd, RESPONSE_SNIPPET_CHARS).to_string(),
        cv_text_snippet: cv.snippet(RESPONSE_SNIPPET_CHARS).to_string(),
        result,
    })
}
