//! Wikipedia: read the desktop article instead of the mobile one.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use url::Url;

use super::host_matches;
use crate::handler::{Handler, PreHandleResult, PreHandler};

pub struct WikipediaHandler;

#[async_trait]
impl PreHandler for WikipediaHandler {
    async fn should_pre_handle(&self, url: &str) -> Result<bool> {
        Ok(host_matches(url, &["wikipedia.org"]))
    }

    async fn pre_handle(&self, url: &str) -> Result<PreHandleResult> {
        let mut parsed = Url::parse(url).with_context(|| format!("invalid wikipedia url {url}"))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| anyhow!("wikipedia url without host: {url}"))?
            .to_ascii_lowercase();

        if let Some(desktop) = desktop_host(&host) {
            parsed
                .set_host(Some(&desktop))
                .with_context(|| format!("cannot rewrite host of {url}"))?;
        }

        Ok(PreHandleResult {
            url: Some(parsed.into()),
            ..Default::default()
        })
    }
}

/// `en.m.wikipedia.org` becomes `en.wikipedia.org`.
fn desktop_host(host: &str) -> Option<String> {
    let language = host.strip_suffix(".m.wikipedia.org")?;
    Some(format!("{language}.wikipedia.org"))
}

pub fn handler() -> Handler {
    Handler::new("wikipedia").with_pre_handler(WikipediaHandler)
}
