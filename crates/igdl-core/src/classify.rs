//! Instagram URL classification
//!
//! Maps a raw, user-supplied string to a [`ContentReference`]. Patterns are
//! tried in a fixed order and the first match wins: post/reel, then profile,
//! then story. A story URL never matches the profile pattern because the
//! profile pattern only accepts a single path segment.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// `/p/<shortcode>` or `/reel/<shortcode>`
static POST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?instagram\.com/(?:p|reel)/([A-Za-z0-9_-]+)")
        .expect("post pattern is valid")
});

/// `/<username>` with an optional trailing slash and query string
static PROFILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?instagram\.com/([A-Za-z0-9_.]+)/?(?:\?.*)?$")
        .expect("profile pattern is valid")
});

/// `/stories/<username>`
static STORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?instagram\.com/stories/([A-Za-z0-9_.]+)")
        .expect("story pattern is valid")
});

/// Kind of content a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Post or reel, addressed by shortcode
    Post,
    /// User profile, addressed by username
    Profile,
    /// User story, addressed by username
    Story,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Profile => "profile",
            ContentKind::Story => "story",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a URL: a shortcode or username plus its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
    pub identifier: String,
    pub kind: ContentKind,
}

impl ContentReference {
    fn new(identifier: &str, kind: ContentKind) -> Self {
        Self {
            identifier: identifier.to_string(),
            kind,
        }
    }
}

/// Returned when a string is not a recognized Instagram URL
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid Instagram URL format")]
pub struct InvalidUrlError;

/// Classify a raw URL into a content reference.
///
/// Leading/trailing whitespace is ignored and `https://` is assumed when the
/// input has no scheme, so `instagram.com/p/ABC` and
/// `https://www.instagram.com/p/ABC/` classify the same way.
pub fn classify(raw_url: &str) -> Result<ContentReference, InvalidUrlError> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err(InvalidUrlError);
    }

    let url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let ordered: [(&Regex, ContentKind); 3] = [
        (&POST_PATTERN, ContentKind::Post),
        (&PROFILE_PATTERN, ContentKind::Profile),
        (&STORY_PATTERN, ContentKind::Story),
    ];

    ordered
        .iter()
        .find_map(|(pattern, kind)| {
            pattern
                .captures(&url)
                .and_then(|caps| caps.get(1))
                .map(|id| ContentReference::new(id.as_str(), *kind))
        })
        .ok_or(InvalidUrlError)
}
