//! Ghost newsletters carry a "view online" link with a stable class.

use anyhow::Result;
use async_trait::async_trait;

use crate::dom::Document;
use crate::handler::{Handler, NewsletterClassifier, NewsletterInput};

const VIEW_ONLINE: &str = ".view-online-link";

pub struct GhostHandler;

#[async_trait]
impl NewsletterClassifier for GhostHandler {
    async fn is_newsletter(&self, input: &NewsletterInput) -> Result<bool> {
        Ok(Document::parse(input.html.as_str()).exists(VIEW_ONLINE))
    }

    fn find_newsletter_header_href(&self, dom: &Document) -> Option<String> {
        dom.select_attr("a.view-online-link[href], .view-online-link a[href]", "href")
    }
}

pub fn handler() -> Handler {
    Handler::new("ghost").with_newsletter(GhostHandler)
}
