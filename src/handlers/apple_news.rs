//! Apple News share links.
//!
//! `apple.news` pages are a thin shell around a link to the publisher's
//! article; the real URL sits in the anchor wrapping `span.click-here`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::Selector;
use tracing::warn;
use url::Url;

use super::host_of;
use crate::dom::Document;
use crate::fetcher::fetch_page_as;
use crate::handler::{Handler, PreHandleResult, PreHandler};
use crate::safety::is_safe_url;

// The share page only carries the publisher link for browser user agents.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

pub struct AppleNewsHandler;

#[async_trait]
impl PreHandler for AppleNewsHandler {
    async fn should_pre_handle(&self, url: &str) -> Result<bool> {
        Ok(host_of(url).as_deref() == Some("apple.news"))
    }

    async fn pre_handle(&self, url: &str) -> Result<PreHandleResult> {
        let page = fetch_page_as(url, BROWSER_USER_AGENT)
            .await
            .context("failed to fetch Apple News page")?;

        let url = publisher_url(&Document::parse(page.body), &page.url_final);

        Ok(PreHandleResult {
            url,
            ..Default::default()
        })
    }
}

/// `href` of the anchor that contains the "click here" span.
pub(crate) fn publisher_link(dom: &Document) -> Option<String> {
    let anchors = Selector::parse("a[href]").ok()?;
    let click_here = Selector::parse("span.click-here").ok()?;
    dom.with_tree(|tree| {
        tree.select(&anchors)
            .find(|a| a.select(&click_here).next().is_some())
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    })
}

/// Absolute publisher URL, provided it passes the safety gate.
pub(crate) fn publisher_url(dom: &Document, base: &Url) -> Option<String> {
    let url: String = base.join(&publisher_link(dom)?).ok()?.into();
    if !is_safe_url(&url) {
        warn!("ignoring unsafe Apple News publisher link {url}");
        return None;
    }
    Some(url)
}

pub fn handler() -> Handler {
    Handler::new("apple_news").with_pre_handler(AppleNewsHandler)
}
