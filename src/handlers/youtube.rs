//! YouTube videos, described through the oEmbed endpoint.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{escape, host_of};
use crate::fetcher::fetch_json;
use crate::handler::{Handler, PreHandleResult, PreHandler};

pub const DEFAULT_OEMBED_URL: &str = "https://www.youtube.com/oembed";

// 16:9 player when oEmbed omits dimensions
const DEFAULT_WIDTH: u32 = 560;
const DEFAULT_HEIGHT: u32 = 315;

pub struct YouTubeHandler {
    oembed_url: String,
}

impl YouTubeHandler {
    pub fn new() -> Self {
        Self::with_oembed_url(DEFAULT_OEMBED_URL)
    }

    pub fn with_oembed_url(oembed_url: impl Into<String>) -> Self {
        Self {
            oembed_url: oembed_url.into(),
        }
    }
}

impl Default for YouTubeHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreHandler for YouTubeHandler {
    async fn should_pre_handle(&self, url: &str) -> Result<bool> {
        Ok(video_id(url).is_some())
    }

    async fn pre_handle(&self, url: &str) -> Result<PreHandleResult> {
        let id = video_id(url).ok_or_else(|| anyhow!("not a youtube video url: {url}"))?;
        let lookup = Url::parse_with_params(&self.oembed_url, &[("url", url), ("format", "json")])
            .context("invalid oembed url")?;
        debug!(video = %id, "fetching youtube oembed");

        let oembed: OEmbed = fetch_json(lookup.as_str(), None)
            .await
            .context("failed to fetch youtube oembed")?;

        Ok(PreHandleResult {
            url: Some(url.to_string()),
            title: Some(oembed.title.clone()),
            content: Some(render(&oembed, &id, url)),
            ..Default::default()
        })
    }
}

/// Video id of a watch, shorts, embed or `youtu.be` URL.
pub(crate) fn video_id(url: &str) -> Option<String> {
    let host = host_of(url)?;
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    let id = match host.as_str() {
        "youtu.be" => segments.next().map(str::to_string),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            match segments.next()? {
                "watch" => parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                "shorts" | "embed" | "live" | "v" => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    }?;

    let valid = !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    valid.then_some(id)
}

fn render(oembed: &OEmbed, id: &str, url: &str) -> String {
    let title = escape(&oembed.title);
    let author = escape(&oembed.author_name);
    let thumbnail = oembed.thumbnail_url.as_deref().map(escape).unwrap_or_default();
    let width = oembed.width.unwrap_or(DEFAULT_WIDTH);
    let height = oembed.height.unwrap_or(DEFAULT_HEIGHT);
    let link = escape(url);
    let id = escape(id);

    format!(
        r#"<html><head><title>{title}</title><meta property="og:image" content="{thumbnail}"><meta property="og:title" content="{title}"><meta property="og:description" content="{title}"><meta property="og:article:author" content="{author}"><meta property="og:url" content="{link}"></head><body><iframe width="{width}" height="{height}" src="https://www.youtube.com/embed/{id}" title="{title}" frameborder="0" allowfullscreen></iframe><p><a href="{link}">{title}</a></p><p itemscope="" itemprop="author" itemtype="http://schema.org/Person">By <a href="{author_url}">{author}</a></p></body></html>"#,
        author_url = oembed.author_url.as_deref().map(escape).unwrap_or_default(),
    )
}

#[derive(Debug, Deserialize)]
struct OEmbed {
    title: String,
    author_name: String,
    author_url: Option<String>,
    thumbnail_url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

pub fn handler() -> Handler {
    Handler::new("youtube").with_pre_handler(YouTubeHandler::new())
}
