//! beehiiv newsletters announce themselves in a header.

use anyhow::Result;
use async_trait::async_trait;

use crate::dom::Document;
use crate::handler::{Handler, NewsletterClassifier, NewsletterInput};

pub struct BeehiivHandler;

#[async_trait]
impl NewsletterClassifier for BeehiivHandler {
    async fn is_newsletter(&self, input: &NewsletterInput) -> Result<bool> {
        Ok(input
            .headers
            .get("x-beehiiv-type")
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("newsletter")))
    }

    fn find_newsletter_header_href(&self, dom: &Document) -> Option<String> {
        dom.anchors(r#"table tr td div a[class*="link"]"#)
            .into_iter()
            .find(|a| a.text.eq_ignore_ascii_case("read online"))
            .and_then(|a| a.href)
    }
}

pub fn handler() -> Handler {
    Handler::new("beehiiv").with_newsletter(BeehiivHandler)
}
