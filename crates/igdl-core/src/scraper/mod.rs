//! Scraping client
//!
//! All Instagram network access goes through the [`Scraper`] trait. The
//! content service only depends on the trait, so tests can swap in a double
//! and production uses [`InstagramClient`].

mod instagram;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::content::{PostMetadata, ProfileMetadata};

pub use instagram::InstagramClient;

/// Chunked body of a raw media fetch
pub type ByteStream = BoxStream<'static, Result<Bytes, ScraperError>>;

/// Errors reported by a scraping client
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("{0}")]
    NotFound(String),

    #[error("Login required to access this content")]
    LoginRequired,

    #[error("Rate limited by Instagram, try again later")]
    RateLimited,

    #[error("Instagram API error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScraperError {
    /// True when the content itself is missing or private, as opposed to a
    /// transport or upstream failure
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ScraperError::NotFound(_) | ScraperError::LoginRequired)
    }
}

/// Resolves Instagram identifiers to metadata and fetches raw media.
///
/// Implementations hold no per-request state and must be safe to share
/// across concurrently running requests.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Look up a post or reel by shortcode
    async fn post(&self, shortcode: &str) -> Result<PostMetadata, ScraperError>;

    /// Look up a profile by username
    async fn profile(&self, username: &str) -> Result<ProfileMetadata, ScraperError>;

    /// Fetch the body at `url` as a stream of chunks
    async fn fetch_raw(&self, url: &str) -> Result<ByteStream, ScraperError>;
}
