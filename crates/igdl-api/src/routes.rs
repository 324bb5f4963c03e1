//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{analyze, download, health};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/health", get(health))
        // Content analysis
        .route("/api/analyze", post(analyze))
        // Media download
        .route("/api/download", post(download))
}
