//! igdl-server: Instagram downloader API binary
//!
//! Usage:
//!   igdl-server                  - Start the HTTP API
//!   igdl-server --config <path>  - Start with an explicit config file
//!   igdl-server --help           - Show help

use std::path::PathBuf;
use std::sync::Arc;

use igdl_core::{Config, ContentService, InstagramClient};
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq)]
enum RunMode {
    /// Serve the HTTP API
    Server { config: Option<PathBuf> },
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1))?;

    let config_path = match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("igdl-server {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server { config } => config,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting igdl-server...");

    let client = InstagramClient::new(&config.scraper)
        .map_err(|e| anyhow::anyhow!("Failed to create Instagram client: {}", e))?;
    let service = ContentService::new(Arc::new(client), config.download.clone());

    tracing::info!("Press Ctrl+C to exit");

    igdl_api::start_server(&config.api, service, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Shutting down...");
    })
    .await
    .map_err(|e| anyhow::anyhow!("HTTP API error: {}", e))?;

    tracing::info!("igdl-server stopped");
    Ok(())
}

/// Parse command line arguments (program name already skipped)
fn parse_args<I>(args: I) -> anyhow::Result<RunMode>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(RunMode::Help),
            "--version" | "-v" => return Ok(RunMode::Version),
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a path"))?;
                config = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("Unknown argument: {} (see --help)", other),
        }
    }

    Ok(RunMode::Server { config })
}

/// Print help message
fn print_help() {
    println!("igdl-server - Instagram downloader API");
    println!();
    println!("Usage:");
    println!("  igdl-server                  Start the HTTP API");
    println!("  igdl-server --config <path>  Load settings from a TOML file");
    println!("  igdl-server --help           Show this help message");
    println!("  igdl-server --version        Show version");
    println!();
    println!("Without --config, ./igdl.toml is used when present.");
    println!();
    println!("Environment Variables:");
    println!("  API_HOST                   Bind address (default: 0.0.0.0)");
    println!("  API_PORT                   HTTP API port (default: 8001)");
    println!("  API_ALLOWED_ORIGINS        Comma-separated CORS origins (default: any)");
    println!("  SCRAPER_USER_AGENT         User agent for Instagram requests");
    println!("  SCRAPER_TIMEOUT_SECS       Request timeout in seconds (default: 60)");
    println!("  SCRAPER_PROXY              HTTP(S) proxy for Instagram requests");
    println!("  INSTAGRAM_DOC_ID           GraphQL document id for post lookups");
    println!("  DOWNLOAD_CHUNK_SIZE        Scratch write chunk size (default: 8192)");
    println!("  DOWNLOAD_VIDEO_THUMBNAILS  Offer image downloads for videos (default: true)");
    println!("  DOWNLOAD_SCRATCH_DIR       Parent of per-request scratch directories");
    println!("  RUST_LOG                   Log filter (default: info)");
}
