//! igdl-core: Instagram content lookup and media download
//!
//! URL の分類、スクレイピングクライアント、コンテンツサービス、
//! 設定管理のコア機能を提供します。

pub mod classify;
pub mod config;
pub mod content;
pub mod error;
pub mod media;
pub mod scraper;
pub mod service;

pub use classify::{ContentKind, ContentReference, InvalidUrlError, classify};
pub use config::{ApiConfig, Config, DownloadConfig, ScraperConfig};
pub use content::{
    ContentSummary, DisplayKind, DownloadOption, DownloadOptionKey, DownloadType, MediaPayload,
    PostMetadata, ProfileMetadata,
};
pub use error::{Error, Result};
pub use scraper::{ByteStream, InstagramClient, Scraper, ScraperError};
pub use service::{ContentService, HealthStatus, ServiceError};
