//! Catch-all for mailing-list email. Registered last.

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::dom::Document;
use crate::handler::{Handler, Headers, NewsletterClassifier, NewsletterInput};
use crate::newsletter::{angle_token, find_newsletter_url};

static READ_ONLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)((View|Read)(.*)(email|post)?(.*)(in your browser|online|on (FS|the Web))|Lire en ligne)")
        .unwrap()
});

pub struct GenericHandler;

#[async_trait]
impl NewsletterClassifier for GenericHandler {
    async fn is_newsletter(&self, input: &NewsletterInput) -> Result<bool> {
        Ok(input.headers.has("list-post") || input.headers.has("list-unsubscribe"))
    }

    async fn parse_newsletter_url(&self, headers: &Headers, html: &str) -> Result<Option<String>> {
        // List-Post is often a mailto: for discussion lists
        if let Some(post) = headers.get("list-post").as_deref().and_then(angle_token)
            && (post.starts_with("http://") || post.starts_with("https://"))
        {
            return Ok(Some(post));
        }
        match self.find_newsletter_header_href(&Document::parse(html)) {
            Some(href) => Ok(find_newsletter_url(&href).await),
            None => Ok(None),
        }
    }

    fn find_newsletter_header_href(&self, dom: &Document) -> Option<String> {
        dom.anchors("a[href]")
            .into_iter()
            .find(|a| READ_ONLINE.is_match(&a.text))
            .and_then(|a| a.href)
    }
}

pub fn handler() -> Handler {
    Handler::new("generic").with_newsletter(GenericHandler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn any_list_header_is_enough() {
        let mut input = NewsletterInput {
            headers: Headers::new().with("List-Unsubscribe", "<mailto:u@list.test>"),
            ..Default::default()
        };
        assert!(GenericHandler.is_newsletter(&input).await.unwrap());

        input.headers = Headers::new().with("Subject", "hello");
        assert!(!GenericHandler.is_newsletter(&input).await.unwrap());
    }

    #[tokio::test]
    async fn prefers_web_list_post() {
        let headers = Headers::new().with("List-Post", "<https://list.test/p/42>");
        let url = GenericHandler.parse_newsletter_url(&headers, "").await.unwrap();
        assert_eq!(url.as_deref(), Some("https://list.test/p/42"));

        let mailto = Headers::new().with("List-Post", "<mailto:list@list.test>");
        let url = GenericHandler.parse_newsletter_url(&mailto, "<p>no links</p>").await.unwrap();
        assert_eq!(url, None);
    }

    #[test]
    fn finds_read_online_links() {
        for text in [
            "View this email in your browser",
            "Read online",
            "View on the Web",
            "Lire en ligne",
        ] {
            let dom = Document::parse(format!(
                r#"<a href="https://a.test/unsub">Unsubscribe</a><a href="https://a.test/web">{text}</a>"#
            ));
            assert_eq!(
                GenericHandler.find_newsletter_header_href(&dom).as_deref(),
                Some("https://a.test/web"),
                "{text}"
            );
        }
    }
}
