//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as CorsAny, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use igdl_core::{ApiConfig, ContentService};

use crate::error::{ApiError, ErrorResponse, INTERNAL_ERROR_DETAIL, Result};
use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ContentService>,
}

impl AppState {
    pub fn new(service: ContentService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// CORS layer: permissive unless an allow-list is configured
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let Some(origins) = &config.allowed_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(CorsAny)
        .allow_headers(CorsAny)
}

/// Answer a handler panic with the generic 500 body
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let cause = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Unexpected error: {}", cause);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            detail: INTERNAL_ERROR_DETAIL.to_string(),
        }),
    )
        .into_response()
}

/// Build the full application router
pub fn build_router(state: AppState, config: &ApiConfig) -> Router {
    Router::new()
        .merge(routes())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(state)
}

/// Start the HTTP API server and run until `shutdown` resolves
pub async fn start_server<F>(config: &ApiConfig, service: ContentService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(AppState::new(service), config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ApiError::Server(format!("Invalid address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::Server(format!("Failed to bind {}: {}", addr, e)))?;

    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ApiError::Server(format!("Server error: {}", e)))?;

    Ok(())
}
