//! Content service
//!
//! Stateless analyze/download/health operations over a shared scraping
//! client. Every failure is reported as either a [`ServiceError::Client`]
//! (the caller's URL or the requested content is unusable) or a
//! [`ServiceError::Server`] (something broke on our side or upstream).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::classify::{ContentKind, ContentReference, classify};
use crate::config::DownloadConfig;
use crate::content::{
    ContentSummary, DisplayKind, DownloadOption, DownloadOptionKey, DownloadType, MediaPayload,
    PostMetadata, ProfileMetadata, truncate_description,
};
use crate::media::fetch_media;
use crate::scraper::{Scraper, ScraperError};

const HEALTH_MESSAGE: &str = "Instagram Downloader API is running";

const MEDIA_TYPE_JPEG: &str = "image/jpeg";
const MEDIA_TYPE_MP4: &str = "video/mp4";

/// Surfaced error of a service operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Caller fault: bad URL, missing content, unsupported request
    #[error("{0}")]
    Client(String),

    /// Internal or upstream failure
    #[error("{0}")]
    Server(String),
}

impl ServiceError {
    pub fn is_client(&self) -> bool {
        matches!(self, ServiceError::Client(_))
    }
}

/// Health check payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

/// Analyze and download operations over a scraping client
pub struct ContentService {
    scraper: Arc<dyn Scraper>,
    download: DownloadConfig,
}

impl ContentService {
    /// Create a new content service
    pub fn new(scraper: Arc<dyn Scraper>, download: DownloadConfig) -> Self {
        Self { scraper, download }
    }

    /// Health check; never touches the scraping client
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy",
            message: HEALTH_MESSAGE,
        }
    }

    /// Classify `raw_url` and describe the content behind it
    pub async fn analyze(&self, raw_url: &str) -> Result<ContentSummary, ServiceError> {
        let reference = classify_or_reject(raw_url)?;

        match reference.kind {
            ContentKind::Post => {
                let post = self.scraper.post(&reference.identifier).await.map_err(|e| {
                    error!("Error fetching post: {}", e);
                    ServiceError::Client(format!("Could not fetch post: {}", e))
                })?;
                Ok(self.post_summary(post))
            }
            ContentKind::Profile => {
                let profile = self
                    .scraper
                    .profile(&reference.identifier)
                    .await
                    .map_err(|e| {
                        error!("Error fetching profile: {}", e);
                        ServiceError::Client(format!("Could not fetch profile: {}", e))
                    })?;
                Ok(profile_summary(profile))
            }
            // Stories need a logged-in session; describe without any lookup
            ContentKind::Story => Ok(story_summary(&reference.identifier)),
        }
    }

    /// Classify `raw_url` and download the requested media.
    ///
    /// `download_type` is the caller's raw string so that unknown types are
    /// reported with the same client error as unsupported combinations.
    /// Filenames are built from the classified identifier, never from
    /// upstream metadata.
    pub async fn download(
        &self,
        raw_url: &str,
        download_type: &str,
    ) -> Result<MediaPayload, ServiceError> {
        let reference = classify_or_reject(raw_url)?;

        let requested = match download_type.parse::<DownloadType>() {
            Ok(t) => t,
            Err(unknown) => return Err(invalid_download_type(&unknown, reference.kind)),
        };

        info!(
            identifier = %reference.identifier,
            kind = %reference.kind,
            download_type = %requested,
            "Download requested"
        );

        match (reference.kind, requested) {
            (ContentKind::Post, DownloadType::Video) => {
                let post = self.lookup_post(&reference.identifier).await?;
                if !post.is_video {
                    warn!(shortcode = %post.shortcode, "Video requested for non-video post");
                    return Err(ServiceError::Client(
                        "Video not available for this post".to_string(),
                    ));
                }
                let video_url = post.video_url.as_deref().ok_or_else(|| {
                    warn!(shortcode = %post.shortcode, "Video post without video URL");
                    ServiceError::Client("Video URL not available".to_string())
                })?;
                let filename = format!("{}.mp4", reference.identifier);
                self.fetch(video_url, filename, MEDIA_TYPE_MP4).await
            }
            (ContentKind::Post, DownloadType::Image) => {
                let post = self.lookup_post(&reference.identifier).await?;
                let filename = format!("{}.jpg", reference.identifier);
                self.fetch(&post.url, filename, MEDIA_TYPE_JPEG).await
            }
            (ContentKind::Profile, DownloadType::ProfilePic) => {
                let profile = self.lookup_profile(&reference.identifier).await?;
                let filename = format!("{}_profile_pic.jpg", reference.identifier);
                self.fetch(&profile.profile_pic_url, filename, MEDIA_TYPE_JPEG)
                    .await
            }
            (kind, requested) => Err(invalid_download_type(requested.as_str(), kind)),
        }
    }

    fn post_summary(&self, post: PostMetadata) -> ContentSummary {
        let kind = DisplayKind::for_post(post.is_video);

        let mut download_options = BTreeMap::new();
        if post.is_video {
            download_options.insert(
                DownloadOptionKey::Video,
                DownloadOption::available("Download video file"),
            );
        }
        if !post.is_video || self.download.video_thumbnails {
            download_options.insert(
                DownloadOptionKey::Image,
                DownloadOption::available("Download image/thumbnail"),
            );
        }

        ContentSummary {
            content_type: kind,
            title: format!("{} by @{}", kind.label(), post.owner_username),
            description: truncate_description(post.caption.as_deref()),
            thumbnail_url: post.url,
            username: post.owner_username,
            download_options,
        }
    }

    async fn lookup_post(&self, shortcode: &str) -> Result<PostMetadata, ServiceError> {
        self.scraper
            .post(shortcode)
            .await
            .map_err(|e| lookup_failure("post", e))
    }

    async fn lookup_profile(&self, username: &str) -> Result<ProfileMetadata, ServiceError> {
        self.scraper
            .profile(username)
            .await
            .map_err(|e| lookup_failure("profile", e))
    }

    async fn fetch(
        &self,
        url: &str,
        filename: String,
        media_type: &'static str,
    ) -> Result<MediaPayload, ServiceError> {
        let bytes = fetch_media(self.scraper.as_ref(), url, &self.download)
            .await
            .map_err(|e| {
                error!("Download error: {}", e);
                ServiceError::Server(format!("Download failed: {}", e))
            })?;

        info!(filename = %filename, size = bytes.len(), "Download complete");

        Ok(MediaPayload {
            bytes,
            media_type,
            filename,
        })
    }
}

fn classify_or_reject(raw_url: &str) -> Result<ContentReference, ServiceError> {
    classify(raw_url).map_err(|e| {
        warn!(url = %raw_url, "Rejected URL: {}", e);
        ServiceError::Client(e.to_string())
    })
}

fn invalid_download_type(download_type: &str, kind: ContentKind) -> ServiceError {
    warn!(download_type, %kind, "Invalid download type");
    ServiceError::Client(format!(
        "Invalid download type '{}' for this {} content",
        download_type, kind
    ))
}

/// Missing or private content is the caller's problem; anything else
/// during a download lookup is ours
fn lookup_failure(what: &str, e: ScraperError) -> ServiceError {
    if e.is_unavailable() {
        warn!("Could not fetch {}: {}", what, e);
        ServiceError::Client(format!("Could not fetch {}: {}", what, e))
    } else {
        error!("Download error while fetching {}: {}", what, e);
        ServiceError::Server(format!("Download failed: {}", e))
    }
}

fn profile_summary(profile: ProfileMetadata) -> ContentSummary {
    let mut download_options = BTreeMap::new();
    download_options.insert(
        DownloadOptionKey::ProfilePic,
        DownloadOption::available("Download profile picture"),
    );

    ContentSummary {
        content_type: DisplayKind::Profile,
        title: format!("Profile: @{}", profile.username),
        description: truncate_description(profile.biography.as_deref()),
        thumbnail_url: profile.profile_pic_url,
        username: profile.username,
        download_options,
    }
}

fn story_summary(username: &str) -> ContentSummary {
    let mut download_options = BTreeMap::new();
    download_options.insert(
        DownloadOptionKey::Story,
        DownloadOption::unavailable("Stories require login (not supported in public mode)"),
    );

    ContentSummary {
        content_type: DisplayKind::Story,
        title: format!("Story by @{}", username),
        description: "Stories require Instagram login to access".to_string(),
        thumbnail_url: String::new(),
        username: username.to_string(),
        download_options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::ByteStream;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scraper double with canned metadata and call counters
    #[derive(Default)]
    struct MockScraper {
        post: Option<PostMetadata>,
        profile: Option<ProfileMetadata>,
        fail_fetch: bool,
        lookups: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl MockScraper {
        fn with_post(post: PostMetadata) -> Self {
            Self {
                post: Some(post),
                ..Self::default()
            }
        }

        fn calls(&self) -> usize {
            self.lookups.load(Ordering::SeqCst) + self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Scraper for MockScraper {
        async fn post(&self, shortcode: &str) -> Result<PostMetadata, ScraperError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.post
                .clone()
                .ok_or_else(|| ScraperError::NotFound(format!("Post {} not found", shortcode)))
        }

        async fn profile(&self, username: &str) -> Result<ProfileMetadata, ScraperError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match &self.profile {
                Some(profile) => Ok(profile.clone()),
                None if username == "missing" => Err(ScraperError::NotFound(format!(
                    "Profile {} not found",
                    username
                ))),
                None => Err(ScraperError::RateLimited),
            }
        }

        async fn fetch_raw(&self, url: &str) -> Result<ByteStream, ScraperError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch {
                return Err(ScraperError::Api("Media download HTTP 503".to_string()));
            }
            let body = Bytes::from(format!("bytes of {}", url));
            Ok(futures::stream::iter(vec![Ok(body)]).boxed())
        }
    }

    fn photo_post() -> PostMetadata {
        PostMetadata {
            shortcode: "ABCD1234".to_string(),
            owner_username: "alice".to_string(),
            caption: Some("hello".to_string()),
            is_video: false,
            url: "https://cdn.example/photo.jpg".to_string(),
            video_url: None,
        }
    }

    fn video_post() -> PostMetadata {
        PostMetadata {
            shortcode: "REEL42".to_string(),
            owner_username: "bob".to_string(),
            caption: None,
            is_video: true,
            url: "https://cdn.example/thumb.jpg".to_string(),
            video_url: Some("https://cdn.example/clip.mp4".to_string()),
        }
    }

    fn profile() -> ProfileMetadata {
        ProfileMetadata {
            username: "carol".to_string(),
            biography: Some("x".repeat(101)),
            profile_pic_url: "https://cdn.example/carol.jpg".to_string(),
        }
    }

    struct Fixture {
        service: ContentService,
        scraper: Arc<MockScraper>,
        scratch: tempfile::TempDir,
    }

    impl Fixture {
        fn new(scraper: MockScraper) -> Self {
            Self::with_thumbnails(scraper, true)
        }

        fn with_thumbnails(scraper: MockScraper, video_thumbnails: bool) -> Self {
            let scratch = tempfile::tempdir().unwrap();
            let scraper = Arc::new(scraper);
            let config = DownloadConfig {
                video_thumbnails,
                scratch_dir: Some(scratch.path().to_path_buf()),
                ..DownloadConfig::default()
            };
            let service = ContentService::new(scraper.clone(), config);
            Self {
                service,
                scraper,
                scratch,
            }
        }

        fn scratch_is_empty(&self) -> bool {
            std::fs::read_dir(self.scratch.path()).unwrap().next().is_none()
        }
    }

    #[test]
    fn test_health() {
        let fixture = Fixture::new(MockScraper::default());
        let health = fixture.service.health();
        assert_eq!(health.status, "healthy");
        assert!(!health.message.is_empty());
        assert_eq!(fixture.scraper.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_photo_post() {
        let fixture = Fixture::new(MockScraper::with_post(photo_post()));

        let summary = fixture
            .service
            .analyze("https://www.instagram.com/p/ABCD1234/")
            .await
            .unwrap();

        assert_eq!(summary.content_type, DisplayKind::Post);
        assert_eq!(summary.title, "Post by @alice");
        assert_eq!(summary.description, "hello");
        assert_eq!(summary.thumbnail_url, "https://cdn.example/photo.jpg");
        assert_eq!(summary.username, "alice");
        assert_eq!(summary.download_options.len(), 1);
        assert!(summary.download_options[&DownloadOptionKey::Image].available);
    }

    #[tokio::test]
    async fn test_analyze_video_post_via_post_url_is_reel() {
        let fixture = Fixture::new(MockScraper::with_post(video_post()));

        let summary = fixture
            .service
            .analyze("instagram.com/p/REEL42")
            .await
            .unwrap();

        assert_eq!(summary.content_type, DisplayKind::Reel);
        assert_eq!(summary.title, "Reel by @bob");
        assert_eq!(summary.description, "");
        assert!(summary.download_options[&DownloadOptionKey::Video].available);
        assert!(summary.download_options[&DownloadOptionKey::Image].available);
    }

    #[tokio::test]
    async fn test_analyze_reel_url_with_photo_is_post() {
        let fixture = Fixture::new(MockScraper::with_post(photo_post()));

        let summary = fixture
            .service
            .analyze("https://www.instagram.com/reel/ABCD1234/")
            .await
            .unwrap();

        assert_eq!(summary.content_type, DisplayKind::Post);
        assert!(!summary.download_options.contains_key(&DownloadOptionKey::Video));
    }

    #[tokio::test]
    async fn test_analyze_video_without_thumbnails() {
        let fixture = Fixture::with_thumbnails(MockScraper::with_post(video_post()), false);

        let summary = fixture
            .service
            .analyze("https://www.instagram.com/reel/REEL42/")
            .await
            .unwrap();

        assert!(summary.download_options.contains_key(&DownloadOptionKey::Video));
        assert!(!summary.download_options.contains_key(&DownloadOptionKey::Image));
    }

    #[tokio::test]
    async fn test_analyze_profile_truncates_biography() {
        let fixture = Fixture::new(MockScraper {
            profile: Some(profile()),
            ..MockScraper::default()
        });

        let summary = fixture
            .service
            .analyze("https://www.instagram.com/carol/")
            .await
            .unwrap();

        assert_eq!(summary.content_type, DisplayKind::Profile);
        assert_eq!(summary.title, "Profile: @carol");
        assert_eq!(summary.description, format!("{}...", "x".repeat(100)));
        assert_eq!(summary.thumbnail_url, "https://cdn.example/carol.jpg");
        assert!(summary.download_options[&DownloadOptionKey::ProfilePic].available);
    }

    #[tokio::test]
    async fn test_analyze_story_makes_no_external_call() {
        let fixture = Fixture::new(MockScraper::default());

        let summary = fixture
            .service
            .analyze("https://www.instagram.com/stories/dave/")
            .await
            .unwrap();

        assert_eq!(summary.content_type, DisplayKind::Story);
        assert_eq!(summary.title, "Story by @dave");
        assert_eq!(summary.description, "Stories require Instagram login to access");
        assert_eq!(summary.thumbnail_url, "");
        assert!(!summary.download_options[&DownloadOptionKey::Story].available);
        assert_eq!(fixture.scraper.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_invalid_url() {
        let fixture = Fixture::new(MockScraper::default());

        for raw in ["", "https://example.com/not-instagram"] {
            let err = fixture.service.analyze(raw).await.unwrap_err();
            assert_eq!(
                err,
                ServiceError::Client("Invalid Instagram URL format".to_string())
            );
        }
        assert_eq!(fixture.scraper.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_lookup_failures_are_client_errors() {
        let fixture = Fixture::new(MockScraper::default());

        let err = fixture
            .service
            .analyze("https://www.instagram.com/p/NOPE/")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Client("Could not fetch post: Post NOPE not found".to_string())
        );

        // Upstream failures collapse into the same client error kind
        let err = fixture
            .service
            .analyze("https://www.instagram.com/someone/")
            .await
            .unwrap_err();
        assert!(err.is_client());
        assert!(err.to_string().starts_with("Could not fetch profile: "));
    }

    #[tokio::test]
    async fn test_download_photo_image() {
        let fixture = Fixture::new(MockScraper::with_post(photo_post()));

        let payload = fixture
            .service
            .download("https://www.instagram.com/p/ABCD1234/", "image")
            .await
            .unwrap();

        assert_eq!(payload.media_type, "image/jpeg");
        assert_eq!(payload.filename, "ABCD1234.jpg");
        assert_eq!(payload.bytes, b"bytes of https://cdn.example/photo.jpg");
        assert!(fixture.scratch_is_empty());
    }

    #[tokio::test]
    async fn test_download_video() {
        let fixture = Fixture::new(MockScraper::with_post(video_post()));

        let payload = fixture
            .service
            .download("https://www.instagram.com/reel/REEL42/", "video")
            .await
            .unwrap();

        assert_eq!(payload.media_type, "video/mp4");
        assert_eq!(payload.filename, "REEL42.mp4");
        assert_eq!(payload.bytes, b"bytes of https://cdn.example/clip.mp4");
        assert!(fixture.scratch_is_empty());
    }

    #[tokio::test]
    async fn test_download_video_on_photo_is_client_error() {
        let fixture = Fixture::new(MockScraper::with_post(photo_post()));

        let err = fixture
            .service
            .download("https://www.instagram.com/p/ABCD1234/", "video")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::Client("Video not available for this post".to_string())
        );
        assert_eq!(fixture.scraper.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_download_video_without_url_is_client_error() {
        let mut post = video_post();
        post.video_url = None;
        let fixture = Fixture::new(MockScraper::with_post(post));

        let err = fixture
            .service
            .download("https://www.instagram.com/reel/REEL42/", "video")
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::Client("Video URL not available".to_string()));
    }

    #[tokio::test]
    async fn test_download_profile_pic() {
        let fixture = Fixture::new(MockScraper {
            profile: Some(profile()),
            ..MockScraper::default()
        });

        let payload = fixture
            .service
            .download("instagram.com/carol", "profile_pic")
            .await
            .unwrap();

        assert_eq!(payload.media_type, "image/jpeg");
        assert_eq!(payload.filename, "carol_profile_pic.jpg");
        assert!(fixture.scratch_is_empty());
    }

    #[tokio::test]
    async fn test_download_ignores_upstream_shortcode_for_paths() {
        let mut post = photo_post();
        post.shortcode = "../leak".to_string();
        let fixture = Fixture::new(MockScraper::with_post(post));

        let payload = fixture
            .service
            .download("https://www.instagram.com/p/ABCD1234/", "image")
            .await
            .unwrap();

        assert_eq!(payload.filename, "ABCD1234.jpg");
        assert!(fixture.scratch_is_empty());
        let parent = fixture.scratch.path().parent().unwrap();
        assert!(!parent.join("leak").exists());
        assert!(!parent.join("leak.jpg").exists());
    }

    #[tokio::test]
    async fn test_download_ignores_upstream_username_for_filename() {
        let mut upstream = profile();
        upstream.username = "../../etc/carol".to_string();
        let fixture = Fixture::new(MockScraper {
            profile: Some(upstream),
            ..MockScraper::default()
        });

        let payload = fixture
            .service
            .download("https://www.instagram.com/carol/", "profile_pic")
            .await
            .unwrap();

        assert_eq!(payload.filename, "carol_profile_pic.jpg");
        assert!(fixture.scratch_is_empty());
    }

    #[tokio::test]
    async fn test_download_mismatched_type_is_client_error() {
        let fixture = Fixture::new(MockScraper::with_post(photo_post()));

        let err = fixture
            .service
            .download("https://www.instagram.com/p/ABCD1234/", "profile_pic")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Client(
                "Invalid download type 'profile_pic' for this post content".to_string()
            )
        );

        let err = fixture
            .service
            .download("https://www.instagram.com/stories/dave/", "image")
            .await
            .unwrap_err();
        assert!(err.is_client());
        assert!(err.to_string().contains("story"));
        assert_eq!(fixture.scraper.calls(), 0);
    }

    #[tokio::test]
    async fn test_download_unknown_type_is_client_error() {
        let fixture = Fixture::new(MockScraper::with_post(photo_post()));

        for raw in [
            "https://www.instagram.com/p/ABCD1234/",
            "https://www.instagram.com/carol/",
            "https://www.instagram.com/stories/dave/",
        ] {
            let err = fixture.service.download(raw, "hologram").await.unwrap_err();
            assert!(err.is_client());
            assert!(err.to_string().contains("'hologram'"));
        }
        assert_eq!(fixture.scraper.calls(), 0);
    }

    #[tokio::test]
    async fn test_download_invalid_url_is_client_error() {
        let fixture = Fixture::new(MockScraper::default());

        let err = fixture
            .service
            .download("not a url", "image")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Client("Invalid Instagram URL format".to_string())
        );
    }

    #[tokio::test]
    async fn test_download_missing_content_is_client_error() {
        let fixture = Fixture::new(MockScraper::default());

        let err = fixture
            .service
            .download("https://www.instagram.com/missing/", "profile_pic")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Client("Could not fetch profile: Profile missing not found".to_string())
        );
    }

    #[tokio::test]
    async fn test_download_upstream_lookup_failure_is_server_error() {
        let fixture = Fixture::new(MockScraper::default());

        let err = fixture
            .service
            .download("https://www.instagram.com/erin/", "profile_pic")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ServiceError::Server(
                "Download failed: Rate limited by Instagram, try again later".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_download_fetch_failure_is_server_error_and_cleans_up() {
        let fixture = Fixture::new(MockScraper {
            post: Some(photo_post()),
            fail_fetch: true,
            ..MockScraper::default()
        });

        let err = fixture
            .service
            .download("https://www.instagram.com/p/ABCD1234/", "image")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ServiceError::Server(
                "Download failed: Instagram API error: Media download HTTP 503".to_string()
            )
        );
        assert!(fixture.scratch_is_empty());
    }
}
