//! ConvertKit newsletters, recognised by images served from ConvertKit.

use anyhow::Result;
use async_trait::async_trait;

use crate::dom::Document;
use crate::handler::{Handler, NewsletterClassifier, NewsletterInput};

const CONVERTKIT_IMAGES: &str = r#"img[src*="convertkit.com"], img[src*="convertkit-mail"]"#;
const CONFIRMATION_SUBJECT: &str = "confirm your subscription";

pub struct ConvertKitHandler;

#[async_trait]
impl NewsletterClassifier for ConvertKitHandler {
    async fn is_newsletter(&self, input: &NewsletterInput) -> Result<bool> {
        if input.subject.to_lowercase().contains(CONFIRMATION_SUBJECT) {
            return Ok(false);
        }
        Ok(Document::parse(input.html.as_str()).exists(CONVERTKIT_IMAGES))
    }

    fn find_newsletter_header_href(&self, dom: &Document) -> Option<String> {
        dom.anchors("table tr td div a")
            .into_iter()
            .find(|a| a.text.eq_ignore_ascii_case("view this email in your browser"))
            .and_then(|a| a.href)
    }
}

pub fn handler() -> Handler {
    Handler::new("convertkit").with_newsletter(ConvertKitHandler)
}
