//! Newsletters recognised by who sends them.
//!
//! A [`SenderPattern`] pairs a regex over the `From` header with a regex over
//! the raw HTML whose first capture group is the issue's web URL.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::handler::{Handler, Headers, NewsletterClassifier, NewsletterInput};
use crate::newsletter::find_newsletter_url;

pub struct SenderPattern {
    name: &'static str,
    sender: Regex,
    url: Regex,
}

impl SenderPattern {
    /// Both patterns are compile-time constants at every call site.
    fn new(name: &'static str, sender: &str, url: &str) -> Self {
        Self {
            name,
            sender: Regex::new(sender).unwrap(),
            url: Regex::new(url).unwrap(),
        }
    }

    pub fn axios() -> Self {
        Self::new(
            "axios",
            r"<.+@axios\.com>",
            r"View in browser at <a.*?>(.*?)</a>",
        )
    }

    pub fn morning_brew() -> Self {
        Self::new(
            "morning_brew",
            r"Morning Brew <crew@morningbrew\.com>",
            r#"<a.* href=["']([^"']*)["'].*>View Online</a>"#,
        )
    }

    /// Golang Weekly, JavaScript Weekly and the other Cooper Press titles.
    pub fn cooper_press() -> Self {
        Self::new(
            "cooper_press",
            r"(?i)<[^>]+@(?:cooperpress\.com|[a-z]+weekly\.com)>",
            r#"<a href=["']([^"']*)["'].*>Read on the Web</a>"#,
        )
    }

    pub fn bloomberg() -> Self {
        Self::new(
            "bloomberg",
            r"<.+@mail\.bloombergbusiness\.com>",
            r#"<a class="view-in-browser__url" href=["']([^"']*)["']"#,
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// First capture of the URL pattern, with HTML-escaped ampersands undone.
    pub(crate) fn find_url(&self, html: &str) -> Option<String> {
        let captured = self.url.captures(html)?.get(1)?.as_str().trim();
        (!captured.is_empty()).then(|| captured.replace("&amp;", "&"))
    }
}

#[async_trait]
impl NewsletterClassifier for SenderPattern {
    async fn is_newsletter(&self, input: &NewsletterInput) -> Result<bool> {
        Ok(self.sender.is_match(&input.from)
            && (input.headers.has("list-post") || input.headers.has("list-unsubscribe")))
    }

    async fn parse_newsletter_url(&self, _headers: &Headers, html: &str) -> Result<Option<String>> {
        let Some(href) = self.find_url(html) else {
            debug!(sender = self.name, "no web url in newsletter");
            return Ok(None);
        };
        Ok(find_newsletter_url(&href).await)
    }
}

fn handler_for(pattern: SenderPattern) -> Handler {
    Handler::new(pattern.name()).with_newsletter(pattern)
}

pub fn morning_brew() -> Handler {
    handler_for(SenderPattern::morning_brew())
}

pub fn cooper_press() -> Handler {
    handler_for(SenderPattern::cooper_press())
}

pub fn bloomberg() -> Handler {
    handler_for(SenderPattern::bloomberg())
}
