//! URL shortener expansion.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::host_of;
use crate::fetcher::head_location;
use crate::handler::{Handler, Resolver};

const SHORTENER_HOSTS: &[&str] = &["t.co", "bit.ly", "buff.ly", "ow.ly", "lnkd.in", "tinyurl.com"];

/// Expands shortener links one hop, by reading the redirect target.
pub struct ShortLinkResolver;

#[async_trait]
impl Resolver for ShortLinkResolver {
    async fn should_resolve(&self, url: &str) -> Result<bool> {
        Ok(host_of(url).is_some_and(|host| SHORTENER_HOSTS.contains(&host.as_str())))
    }

    async fn resolve(&self, url: &str) -> Result<Option<String>> {
        let location = head_location(url)
            .await
            .with_context(|| format!("failed to expand short link {url}"))?;
        Ok(location.map(String::from))
    }
}

pub fn handler() -> Handler {
    Handler::new("short_link").with_resolver(ShortLinkResolver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matches_known_shorteners_exactly() {
        let resolver = ShortLinkResolver;
        assert!(resolver.should_resolve("https://t.co/abc123").await.unwrap());
        assert!(resolver.should_resolve("https://bit.ly/3xyz").await.unwrap());
        assert!(resolver.should_resolve("https://www.tinyurl.com/y6").await.unwrap());
        assert!(!resolver.should_resolve("https://t.com/abc").await.unwrap());
        assert!(!resolver.should_resolve("https://nott.co/abc").await.unwrap());
    }
}
