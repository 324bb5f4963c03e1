//! Content types
//!
//! Metadata returned by the scraping client and the shapes handed back to
//! callers of the content service.
//!
//! Serialized field names and option keys are snake_case (`content_type`,
//! `thumbnail_url`, `download_options`, `profile_pic`). This is the wire
//! format of the HTTP API; camelCase spellings are accepted on input only.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Maximum number of characters kept from a caption or biography
pub const DESCRIPTION_MAX_CHARS: usize = 100;

/// Post metadata as resolved by the scraping client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostMetadata {
    pub shortcode: String,
    pub owner_username: String,
    pub caption: Option<String>,
    pub is_video: bool,
    /// Primary still image (display URL)
    pub url: String,
    pub video_url: Option<String>,
}

/// Profile metadata as resolved by the scraping client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileMetadata {
    pub username: String,
    pub biography: Option<String>,
    pub profile_pic_url: String,
}

/// Kind shown to the caller. Unlike [`crate::ContentKind`], posts are split
/// into "post" and "reel" by the fetched video flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Post,
    Reel,
    Profile,
    Story,
}

impl DisplayKind {
    pub fn for_post(is_video: bool) -> Self {
        if is_video {
            DisplayKind::Reel
        } else {
            DisplayKind::Post
        }
    }

    /// Capitalized label used in titles
    pub fn label(&self) -> &'static str {
        match self {
            DisplayKind::Post => "Post",
            DisplayKind::Reel => "Reel",
            DisplayKind::Profile => "Profile",
            DisplayKind::Story => "Story",
        }
    }
}

/// Key in a summary's `download_options` map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadOptionKey {
    Video,
    Image,
    ProfilePic,
    Story,
}

/// A single offered download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadOption {
    pub available: bool,
    pub description: String,
}

impl DownloadOption {
    pub fn available(description: &str) -> Self {
        Self {
            available: true,
            description: description.to_string(),
        }
    }

    pub fn unavailable(description: &str) -> Self {
        Self {
            available: false,
            description: description.to_string(),
        }
    }
}

/// Response of an analyze call, serialized with snake_case field names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentSummary {
    pub content_type: DisplayKind,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub username: String,
    pub download_options: BTreeMap<DownloadOptionKey, DownloadOption>,
}

/// Requested media for a download call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadType {
    Image,
    Video,
    ProfilePic,
}

impl DownloadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadType::Image => "image",
            DownloadType::Video => "video",
            DownloadType::ProfilePic => "profile_pic",
        }
    }
}

impl fmt::Display for DownloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(DownloadType::Image),
            "video" => Ok(DownloadType::Video),
            "profile_pic" | "profilePic" => Ok(DownloadType::ProfilePic),
            other => Err(other.to_string()),
        }
    }
}

/// Downloaded media ready to be returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub filename: String,
}

/// Truncate a caption or biography to [`DESCRIPTION_MAX_CHARS`] characters,
/// appending `...` when anything was cut. Missing text becomes an empty string.
pub fn truncate_description(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    match text.char_indices().nth(DESCRIPTION_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
