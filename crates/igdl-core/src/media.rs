//! Media fetch through a scratch directory
//!
//! The body is streamed into a file under a per-request temporary directory
//! and read back once complete. The directory is owned by a [`TempDir`]
//! guard and is removed when the guard drops, whichever way the fetch ends.

use futures::StreamExt;
use tempfile::TempDir;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::DownloadConfig;
use crate::scraper::{Scraper, ScraperError};

const SCRATCH_PREFIX: &str = "igdl-";

/// Name of the single file written inside each scratch directory
const SCRATCH_FILE: &str = "media";

/// Failure while fetching media into scratch storage
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{0}")]
    Scraper(#[from] ScraperError),

    #[error("scratch storage error: {0}")]
    Io(#[from] std::io::Error),
}

async fn scratch_dir(config: &DownloadConfig) -> std::io::Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);

    match &config.scratch_dir {
        Some(parent) => {
            tokio::fs::create_dir_all(parent).await?;
            builder.tempdir_in(parent)
        }
        None => builder.tempdir(),
    }
}

/// Fetch `url` through the scraping client and return the full body.
pub async fn fetch_media(
    scraper: &dyn Scraper,
    url: &str,
    config: &DownloadConfig,
) -> Result<Vec<u8>, FetchError> {
    let scratch = scratch_dir(config).await?;
    let path = scratch.path().join(SCRATCH_FILE);
    let chunk_size = config.effective_chunk_size();

    let mut stream = scraper.fetch_raw(url).await?;
    let mut file = File::create(&path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for piece in chunk.chunks(chunk_size) {
            file.write_all(piece).await?;
        }
        written += chunk.len() as u64;
    }

    file.flush().await?;
    drop(file);

    let bytes = tokio::fs::read(&path).await?;
    debug!(
        "Fetched {} bytes via {} (scratch file {} bytes)",
        bytes.len(),
        path.display(),
        written
    );

    Ok(bytes)
}
