//! Concrete site and sender strategies.
//!
//! Each module exposes a `handler()` constructor that assembles its
//! capabilities into a [`Handler`](crate::handler::Handler) record. The
//! registry decides the order.

pub mod apple_news;
pub mod ars_technica;
pub mod axios;
pub mod beehiiv;
pub mod convertkit;
pub mod generic;
pub mod ghost;
pub mod image;
pub mod medium;
pub mod pdf;
pub mod scraping_service;
pub mod sender_pattern;
pub mod short_link;
pub mod substack;
pub mod twitter;
pub mod weixin;
pub mod wikipedia;
pub mod youtube;

use tracing::warn;
use url::Url;

use crate::config::Config;
use crate::dom::Document;

/// Lower-cased host of `url` with any leading `www.` removed.
pub(crate) fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// True when the host of `url` is one of `domains` or a subdomain of one.
pub(crate) fn host_matches(url: &str, domains: &[&str]) -> bool {
    host_of(url).is_some_and(|host| {
        domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    })
}

/// Lower-cased path of `url`, for extension checks.
pub(crate) fn path_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.path().to_ascii_lowercase())
}

/// `og:url` of a fetched document, if it declares one.
pub(crate) fn og_url(dom: &Document) -> Option<String> {
    dom.select_attr("meta[property='og:url']", "content")
}

/// Configuration a handler runs with: the one it was built with, otherwise
/// whatever the environment holds right now.
pub(crate) fn current_config(explicit: Option<&Config>) -> Option<Config> {
    if let Some(config) = explicit {
        return Some(config.clone());
    }
    match Config::from_env() {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("ignoring handler configuration: {e}");
            None
        }
    }
}

/// Escape text for inclusion in synthesized HTML, attributes included.
pub(crate) fn escape(text: &str) -> String {
    ammonia::clean_text(text)
}
