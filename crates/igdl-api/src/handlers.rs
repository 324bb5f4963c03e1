//! HTTP API handlers
//!
//! Request handlers for content analysis, media download and health.
//!
//! Response bodies use snake_case field names (`content_type`,
//! `download_options`). Request bodies also accept `downloadType`.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, error, warn};

use igdl_core::{ContentSummary, HealthStatus, MediaPayload};

use crate::error::ApiError;
use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Analyze request payload
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Instagram post, reel, profile or story URL
    pub url: String,
}

/// Download request payload
#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    /// Instagram post, reel or profile URL
    pub url: String,
    /// "image", "video" or "profile_pic"
    #[serde(alias = "downloadType")]
    pub download_type: String,
}

/// Log and convert a service failure
fn surface(err: igdl_core::ServiceError) -> ApiError {
    if err.is_client() {
        warn!("Client error: {}", err);
    } else {
        error!("Server error: {}", err);
    }
    err.into()
}

/// Turn a body extraction failure into a `{detail}` 400
fn rejected(rejection: JsonRejection) -> ApiError {
    warn!("Rejected request body: {}", rejection.body_text());
    ApiError::BadRequest(rejection.body_text())
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(state.service.health())
}

/// Analyze endpoint - classify a URL and describe its content
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<ContentSummary>, ApiError> {
    let Json(req) = payload.map_err(rejected)?;
    debug!("Analyze request: {:?}", req);

    let summary = state.service.analyze(&req.url).await.map_err(surface)?;
    Ok(Json(summary))
}

/// Download endpoint - fetch media and return it as an attachment
pub async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(rejected)?;
    debug!("Download request: {:?}", req);

    let media = state
        .service
        .download(&req.url, &req.download_type)
        .await
        .map_err(surface)?;

    attachment(media)
}

/// Build a binary attachment response
fn attachment(media: MediaPayload) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename={}", media.filename))
        .map_err(|e| ApiError::Internal(format!("Download failed: invalid filename: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(media.media_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        media.bytes,
    )
        .into_response())
}
