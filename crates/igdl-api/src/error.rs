//! エラー型定義 (igdl-api)

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use igdl_core::ServiceError;
use serde::Serialize;
use thiserror::Error;

/// Message returned for failures that must not leak internals
pub const INTERNAL_ERROR_DETAIL: &str = "Internal server error";

/// igdl-api のエラー型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) | ApiError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body: `{"detail": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Client(msg) => ApiError::BadRequest(msg),
            ServiceError::Server(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
            ApiError::Server(_) => INTERNAL_ERROR_DETAIL.to_string(),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, ApiError>;
