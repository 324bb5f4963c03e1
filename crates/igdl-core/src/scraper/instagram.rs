//! Instagram web API client
//!
//! Posts are resolved through the anonymous GraphQL endpoint used by the
//! Instagram web app, profiles through the `web_profile_info` REST endpoint.
//! Neither requires a logged-in session for public content.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::content::{PostMetadata, ProfileMetadata};
use crate::error::{Error, Result};

use super::{ByteStream, Scraper, ScraperError};

/// Instagram GraphQL API endpoint
const GRAPHQL_URL: &str = "https://www.instagram.com/api/graphql";

/// Instagram REST profile endpoint
const PROFILE_URL: &str = "https://i.instagram.com/api/v1/users/web_profile_info/";

/// Instagram web app ID (public, embedded in the web app)
const IG_APP_ID: &str = "936619743392459";

/// Facebook LSD token (anti-CSRF, public static value)
const FB_LSD_TOKEN: &str = "AVqbxe3J_YA";

/// Facebook ASBD ID (public, embedded in the web app)
const FB_ASBD_ID: &str = "129477";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Instagram scraping client
///
/// Wraps a single `reqwest::Client`, so cloning is cheap and connections are
/// pooled across requests.
#[derive(Clone)]
pub struct InstagramClient {
    client: Client,
    doc_id: String,
    graphql_url: String,
    profile_url: String,
}

impl InstagramClient {
    /// Create a new Instagram client
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(CONNECT_TIMEOUT);

        if let Some(proxy_url) = config.effective_proxy() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| Error::Config(format!("Invalid proxy URL {}: {}", proxy_url, e)))?;
            info!("Using outbound proxy for Instagram requests");
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(Error::Http)?;

        Ok(Self {
            client,
            doc_id: config.doc_id.clone(),
            graphql_url: GRAPHQL_URL.to_string(),
            profile_url: PROFILE_URL.to_string(),
        })
    }

    /// Create with custom endpoints (for testing or a local mirror)
    pub fn with_base_urls(
        config: &ScraperConfig,
        graphql_url: impl Into<String>,
        profile_url: impl Into<String>,
    ) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.graphql_url = graphql_url.into();
        client.profile_url = profile_url.into();
        Ok(client)
    }
}

#[async_trait]
impl Scraper for InstagramClient {
    async fn post(&self, shortcode: &str) -> std::result::Result<PostMetadata, ScraperError> {
        info!(shortcode, "Resolving post");

        let variables = serde_json::json!({ "shortcode": shortcode }).to_string();

        let response = self
            .client
            .post(&self.graphql_url)
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-FB-LSD", FB_LSD_TOKEN)
            .header("X-ASBD-ID", FB_ASBD_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .header("Referer", "https://www.instagram.com/")
            .header("Origin", "https://www.instagram.com")
            .form(&[
                ("doc_id", self.doc_id.as_str()),
                ("variables", variables.as_str()),
                ("lsd", FB_LSD_TOKEN),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!("GraphQL response: {} ({} bytes)", status, body.len());

        check_status(status, &body)?;
        parse_post_response(shortcode, &body)
    }

    async fn profile(&self, username: &str) -> std::result::Result<ProfileMetadata, ScraperError> {
        info!(username, "Resolving profile");

        let response = self
            .client
            .get(&self.profile_url)
            .query(&[("username", username)])
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!("Profile response: {} ({} bytes)", status, body.len());

        if status == StatusCode::NOT_FOUND {
            return Err(ScraperError::NotFound(format!("Profile {} not found", username)));
        }
        check_status(status, &body)?;
        parse_profile_response(username, &body)
    }

    async fn fetch_raw(&self, url: &str) -> std::result::Result<ByteStream, ScraperError> {
        debug!("Fetching media: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Media fetch failed: {}", status);
            return Err(ScraperError::Api(format!("Media download HTTP {}", status)));
        }

        Ok(response.bytes_stream().map_err(ScraperError::from).boxed())
    }
}

/// Map non-success statuses to scraper errors
fn check_status(status: StatusCode, body: &str) -> std::result::Result<(), ScraperError> {
    if status.is_success() {
        return Ok(());
    }

    warn!(
        "Instagram API error: {} - {}",
        status,
        body.chars().take(300).collect::<String>()
    );

    match status {
        StatusCode::TOO_MANY_REQUESTS => Err(ScraperError::RateLimited),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ScraperError::LoginRequired),
        StatusCode::NOT_FOUND => Err(ScraperError::NotFound("Content not found".to_string())),
        _ => Err(ScraperError::Api(format!("HTTP {}", status))),
    }
}

// ============================================================================
// GraphQL response (post lookup)
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<GraphQlData>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlData {
    xdt_shortcode_media: Option<ShortcodeMedia>,
    shortcode_media: Option<ShortcodeMedia>,
}

#[derive(Debug, Deserialize)]
struct ShortcodeMedia {
    shortcode: Option<String>,
    #[serde(default)]
    is_video: bool,
    display_url: Option<String>,
    thumbnail_src: Option<String>,
    video_url: Option<String>,
    owner: Option<MediaOwner>,
    #[serde(default)]
    edge_media_to_caption: CaptionEdges,
}

#[derive(Debug, Deserialize)]
struct MediaOwner {
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct CaptionEdges {
    #[serde(default)]
    edges: Vec<CaptionEdge>,
}

#[derive(Debug, Deserialize)]
struct CaptionEdge {
    node: CaptionNode,
}

#[derive(Debug, Deserialize)]
struct CaptionNode {
    text: String,
}

fn parse_post_response(
    shortcode: &str,
    body: &str,
) -> std::result::Result<PostMetadata, ScraperError> {
    let response: GraphQlResponse = serde_json::from_str(body)?;

    if let Some(message) = &response.message {
        if message.contains("login_required") || message.contains("checkpoint_required") {
            return Err(ScraperError::LoginRequired);
        }
    }

    let media = response
        .data
        .and_then(|data| data.xdt_shortcode_media.or(data.shortcode_media))
        .ok_or_else(|| match &response.message {
            Some(message) => ScraperError::Api(message.clone()),
            None => ScraperError::NotFound("Post not found or media unavailable".to_string()),
        })?;

    let url = media
        .display_url
        .or(media.thumbnail_src)
        .ok_or_else(|| ScraperError::NotFound("Post has no displayable media".to_string()))?;

    let caption = media
        .edge_media_to_caption
        .edges
        .into_iter()
        .next()
        .map(|edge| edge.node.text);

    Ok(PostMetadata {
        shortcode: media.shortcode.unwrap_or_else(|| shortcode.to_string()),
        owner_username: media.owner.map(|o| o.username).unwrap_or_default(),
        caption,
        is_video: media.is_video,
        url,
        video_url: media.video_url,
    })
}

// ============================================================================
// REST response (profile lookup)
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    data: Option<ProfileData>,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    user: Option<ProfileUser>,
}

#[derive(Debug, Deserialize)]
struct ProfileUser {
    username: String,
    biography: Option<String>,
    profile_pic_url: Option<String>,
    profile_pic_url_hd: Option<String>,
}

fn parse_profile_response(
    username: &str,
    body: &str,
) -> std::result::Result<ProfileMetadata, ScraperError> {
    let response: ProfileResponse = serde_json::from_str(body)?;

    let user = response
        .data
        .and_then(|data| data.user)
        .ok_or_else(|| ScraperError::NotFound(format!("Profile {} not found", username)))?;

    let profile_pic_url = user
        .profile_pic_url_hd
        .or(user.profile_pic_url)
        .unwrap_or_default();

    Ok(ProfileMetadata {
        username: user.username,
        biography: user.biography.filter(|b| !b.is_empty()),
        profile_pic_url,
    })
}
