//! igdl-api: HTTP API for the Instagram downloader
//!
//! Exposes analyze, download and health endpoints over axum.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, build_router, start_server};
