//! Axios: posts are laid out in tables, with ads and spacers in tiny ones.

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::host_matches;
use super::sender_pattern::SenderPattern;
use crate::dom::Document;
use crate::handler::{Handler, PreParser};

/// Tables with less text than this are layout, not content.
const MIN_TABLE_TEXT: usize = 20;

pub struct AxiosHandler;

#[async_trait]
impl PreParser for AxiosHandler {
    async fn should_pre_parse(&self, url: &str, _dom: &Document) -> Result<bool> {
        Ok(host_matches(url, &["axios.com"]))
    }

    async fn pre_parse(&self, _url: &str, dom: Document) -> Result<Document> {
        dom.edit(|root| {
            // Dropping an inner table can leave its parent short, so repeat
            // until a pass removes nothing.
            loop {
                let short: Vec<_> = root
                    .select("table")
                    .map_err(|()| anyhow!("invalid table selector"))?
                    .filter(|table| table.text_contents().trim().chars().count() < MIN_TABLE_TEXT)
                    .collect();
                if short.is_empty() {
                    return Ok(());
                }
                for table in short {
                    table.as_node().detach();
                }
            }
        })
    }
}

pub fn handler() -> Handler {
    Handler::new("axios")
        .with_pre_parser(AxiosHandler)
        .with_newsletter(SenderPattern::axios())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = r#"<html><body>
        <table><tr><td>Ad</td></tr></table>
        <table><tr><td>
            <p>Why it matters: the story is long enough to keep.</p>
            <table><tr><td>spacer</td></tr></table>
        </td></tr></table>
        <table><tr><td>Short outer <table><tr><td>with an inner table</td></tr></table></td></tr></table>
        </body></html>"#;

    #[tokio::test]
    async fn removes_short_tables_until_stable() {
        let once = AxiosHandler
            .pre_parse("https://www.axios.com/2024/01/01/story", Document::parse(POST))
            .await
            .unwrap();
        let text = once.select_text("body").unwrap_or_default();
        assert!(text.contains("Why it matters"));
        assert!(!text.contains("Ad "));
        assert!(!text.contains("spacer"));

        let twice = AxiosHandler
            .pre_parse("https://www.axios.com/2024/01/01/story", once.clone())
            .await
            .unwrap();
        assert_eq!(twice.select_text("body"), once.select_text("body"));
        assert!(!twice.exists("table table"));
    }

    #[tokio::test]
    async fn only_axios_pages() {
        let dom = Document::parse("");
        assert!(AxiosHandler.should_pre_parse("https://www.axios.com/a", &dom).await.unwrap());
        assert!(!AxiosHandler.should_pre_parse("https://notaxios.com/a", &dom).await.unwrap());
    }
}
