//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. igdl.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Error;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "igdl.toml";

/// Main configuration for igdl
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Outbound scraping client configuration
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Media download configuration
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind host for HTTP API server
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Port for HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins (e.g., ["http://localhost:3000"])
    /// If unset, any origin is allowed
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent sent on every outbound request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// GraphQL persisted query id used for post lookups (rotates every few weeks)
    #[serde(default = "default_doc_id")]
    pub doc_id: String,

    /// Optional outbound proxy URL
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            doc_id: default_doc_id(),
            proxy: None,
        }
    }
}

impl ScraperConfig {
    /// Proxy URL, ignoring empty and explicitly disabled values
    pub fn effective_proxy(&self) -> Option<&str> {
        self.proxy
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != "none" && *p != "disabled")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Size of each write into the scratch file, in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Offer an image download for video posts (the video thumbnail)
    #[serde(default = "default_video_thumbnails")]
    pub video_thumbnails: bool,

    /// Parent directory for per-request scratch directories
    /// If unset, the system temp directory is used
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            video_thumbnails: default_video_thumbnails(),
            scratch_dir: None,
        }
    }
}

impl DownloadConfig {
    /// Chunk size, with 0 treated as the default
    pub fn effective_chunk_size(&self) -> usize {
        if self.chunk_size == 0 {
            default_chunk_size()
        } else {
            self.chunk_size
        }
    }
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8001
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_doc_id() -> String {
    "8845758582119845".to_string()
}

fn default_chunk_size() -> usize {
    8192
}

fn default_video_thumbnails() -> bool {
    true
}

/// Parse a boolean env value; anything but "false"/"0"/"no" counts as true
fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "false" | "0" | "no")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換され、
    /// その後、環境変数による上書きが適用されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut cfg = Self::from_toml_str(&toml_content)?;
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Parse TOML content (after `${VAR}` expansion) without env overrides
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let expanded_content = Self::expand_env_vars(content);

        toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// 設定を読み込む
    ///
    /// 1. 明示的なパスが指定された場合はそのファイル (存在しなければエラー)
    /// 2. `./igdl.toml`
    /// 3. 見つからない場合は環境変数とデフォルト値のみ
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        if let Some(path) = path {
            return Self::from_toml_file(path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }

        Self::from_env()
    }

    /// Load configuration from environment variables and defaults
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        // API 設定の上書き
        if let Ok(host) = std::env::var("API_HOST") {
            if !host.is_empty() {
                self.api.host = host;
            }
        }
        if let Ok(port) = std::env::var("API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid API_PORT"),
            }
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins = Some(split_list(&origins));
        }

        // Scraper 設定の上書き
        if let Ok(user_agent) = std::env::var("SCRAPER_USER_AGENT") {
            if !user_agent.is_empty() {
                self.scraper.user_agent = user_agent;
            }
        }
        if let Ok(timeout) = std::env::var("SCRAPER_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.scraper.timeout_secs = t;
            }
        }
        if let Ok(doc_id) = std::env::var("INSTAGRAM_DOC_ID") {
            if !doc_id.is_empty() {
                self.scraper.doc_id = doc_id;
            }
        }
        if let Ok(proxy) = std::env::var("SCRAPER_PROXY") {
            self.scraper.proxy = Some(proxy);
        }

        // Download 設定の上書き
        if let Ok(size) = std::env::var("DOWNLOAD_CHUNK_SIZE") {
            if let Ok(s) = size.parse() {
                self.download.chunk_size = s;
            }
        }
        if let Ok(enabled) = std::env::var("DOWNLOAD_VIDEO_THUMBNAILS") {
            self.download.video_thumbnails = parse_flag(&enabled);
        }
        if let Ok(dir) = std::env::var("DOWNLOAD_SCRATCH_DIR") {
            if !dir.is_empty() {
                self.download.scratch_dir = Some(PathBuf::from(dir));
            }
        }
    }
}
