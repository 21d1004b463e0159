//! Tweets, via the Twitter v2 API.
//!
//! Status pages are rendered client-side, so a plain fetch yields nothing
//! worth extracting. When a bearer token is configured the tweet and its
//! author are fetched from the API and stitched into a small HTML page.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkify::{LinkFinder, LinkKind};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{current_config, escape, host_matches};
use crate::config::Config;
use crate::fetcher::fetch_json;
use crate::handler::{Handler, PreHandleResult, PreHandler};

const TWITTER_HOSTS: &[&str] = &["twitter.com", "x.com"];

#[derive(Default)]
pub struct TwitterHandler {
    config: Option<Config>,
}

impl TwitterHandler {
    /// Reads the bearer token from the environment on every call.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config: Some(config),
        }
    }

    fn credentials(&self) -> Option<(String, String)> {
        let config = current_config(self.config.as_ref())?;
        let token = config.twitter_bearer_token()?.to_string();
        Some((token, config.twitter_api_url().to_string()))
    }
}

#[async_trait]
impl PreHandler for TwitterHandler {
    async fn should_pre_handle(&self, url: &str) -> Result<bool> {
        if !host_matches(url, TWITTER_HOSTS) || status_id(url).is_none() {
            return Ok(false);
        }
        if self.credentials().is_none() {
            debug!("no twitter bearer token configured");
            return Ok(false);
        }
        Ok(true)
    }

    async fn pre_handle(&self, url: &str) -> Result<PreHandleResult> {
        let id = status_id(url).ok_or_else(|| anyhow!("not a tweet url: {url}"))?;
        let (token, api_url) = self
            .credentials()
            .ok_or_else(|| anyhow!("twitter bearer token is not configured"))?;

        let lookup = Url::parse_with_params(
            &format!("{api_url}/tweets/{id}"),
            &[
                ("expansions", "author_id,attachments.media_keys"),
                ("tweet.fields", "created_at,text"),
                ("user.fields", "name,username,profile_image_url"),
                ("media.fields", "type,url,preview_image_url"),
            ],
        )
        .context("invalid twitter api url")?;

        let response: TweetResponse = fetch_json(lookup.as_str(), Some(&token))
            .await
            .context("failed to fetch tweet")?;

        let tweet = &response.data;
        let author = response
            .includes
            .users
            .iter()
            .find(|user| user.id == tweet.author_id)
            .ok_or_else(|| anyhow!("tweet {id} has no author in the response"))?;

        let canonical = format!("https://twitter.com/{}/status/{}", author.username, tweet.id);
        Ok(PreHandleResult {
            url: Some(canonical.clone()),
            title: Some(format!("{} on Twitter", author.name)),
            content: Some(render(&response, author, &canonical)),
            ..Default::default()
        })
    }
}

/// Numeric status id from `/<user>/status/<id>` or `/i/web/status/<id>`.
pub(crate) fn status_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.find(|segment| *segment == "status" || *segment == "statuses")?;
    segments
        .next()
        .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

/// Escaped tweet text with bare URLs turned into links and line breaks kept.
fn linkify_text(text: &str) -> String {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]);

    text.split('\n')
        .map(|line| {
            finder
                .spans(line)
                .map(|span| match span.kind() {
                    Some(LinkKind::Url) => {
                        let href = escape(span.as_str());
                        format!(r#"<a href="{href}">{href}</a>"#)
                    }
                    _ => escape(span.as_str()),
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("<br>")
}

fn render(response: &TweetResponse, author: &User, canonical: &str) -> String {
    let tweet = &response.data;
    let name = escape(&author.name);
    let username = escape(&author.username);
    let avatar = author.profile_image_url.as_deref().map(escape).unwrap_or_default();
    let published = tweet
        .created_at
        .map(|at| at.format("%b %-d, %Y").to_string())
        .unwrap_or_default();

    let images: String = response
        .includes
        .media
        .iter()
        .filter_map(|media| media.url.as_deref().or(media.preview_image_url.as_deref()))
        .map(|src| format!(r#"<img src="{}">"#, escape(src)))
        .collect();

    format!(
        r#"<html><head><title>{name} on Twitter</title><meta property="og:image" content="{avatar}"><meta property="og:title" content="{name} on Twitter"><meta property="og:description" content="{description}"><meta property="og:url" content="{canonical}"><meta name="author" content="{name}"></head><body><div class="tweet"><p>{text}</p>{images}<p><a href="https://twitter.com/{username}">{name} (@{username})</a> <time>{published}</time></p></div></body></html>"#,
        description = escape(&tweet.text),
        canonical = escape(canonical),
        text = linkify_text(&tweet.text),
    )
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: Tweet,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    author_id: String,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    name: String,
    username: String,
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Media {
    url: Option<String>,
    preview_image_url: Option<String>,
}

pub fn handler() -> Handler {
    Handler::new("twitter").with_pre_handler(TwitterHandler::new())
}
