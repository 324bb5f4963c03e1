//! Error types for igdl-core

use thiserror::Error;

/// Main error type for igdl-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for igdl-core
pub type Result<T> = std::result::Result<T, Error>;
