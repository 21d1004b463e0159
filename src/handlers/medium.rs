//! Medium articles: drop the `source` tracking parameter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use super::host_matches;
use crate::handler::{Handler, PreHandleResult, PreHandler};

pub struct MediumHandler;

#[async_trait]
impl PreHandler for MediumHandler {
    async fn should_pre_handle(&self, url: &str) -> Result<bool> {
        Ok(host_matches(url, &["medium.com"]))
    }

    async fn pre_handle(&self, url: &str) -> Result<PreHandleResult> {
        Ok(PreHandleResult {
            url: Some(strip_source(url)?),
            ..Default::default()
        })
    }
}

fn strip_source(url: &str) -> Result<String> {
    let mut parsed = Url::parse(url).with_context(|| format!("invalid medium url {url}"))?;
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != "source")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(&kept);
    }
    Ok(parsed.into())
}

pub fn handler() -> Handler {
    Handler::new("medium").with_pre_handler(MediumHandler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn removes_source_parameter() {
        let result = MediumHandler
            .pre_handle("https://medium.com/@writer/post-1a2b?source=rss----1&sk=abc")
            .await
            .unwrap();
        assert_eq!(
            result.url.as_deref(),
            Some("https://medium.com/@writer/post-1a2b?sk=abc")
        );
    }

    #[tokio::test]
    async fn drops_empty_query() {
        let result = MediumHandler
            .pre_handle("https://writer.medium.com/post?source=email")
            .await
            .unwrap();
        assert_eq!(result.url.as_deref(), Some("https://writer.medium.com/post"));
    }

    #[tokio::test]
    async fn matches_medium_hosts() {
        assert!(MediumHandler.should_pre_handle("https://medium.com/p/1").await.unwrap());
        assert!(MediumHandler.should_pre_handle("https://eng.medium.com/p/1").await.unwrap());
        assert!(!MediumHandler.should_pre_handle("https://medium.org/p/1").await.unwrap());
    }
}
