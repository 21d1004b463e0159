//! Helpers shared by newsletter handlers and the newsletter result builder.

mod address;
pub mod rfc2047;

pub use address::parse_author;

use anyhow::{Result, bail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::fetcher::head_location;
use crate::handler::{NewsletterClassifier, NewsletterInput, NewsletterResult};
use crate::safety::validate_url;

/// Base of synthesized newsletter URLs when a handler has no better default.
pub const DEFAULT_NEWSLETTER_URL: &str = "https://triage.example.com/no_url";

static UNSUB_HTTP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(https?://[^>]*)>").unwrap());

static UNSUB_MAILTO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<mailto:([^>]*)>").unwrap());

static ANGLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^>]*)>").unwrap());

/// Parsed `List-Unsubscribe` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unsubscribe {
    pub mail_to: Option<String>,
    pub http_url: Option<String>,
}

/// Parse a `List-Unsubscribe` header such as
/// `<https://x.com/unsub>, <mailto:unsub@x.com>`. Token order does not
/// matter; encoded-words are decoded first.
pub fn parse_unsubscribe(header: &str) -> Unsubscribe {
    let decoded = rfc2047::decode_words(header);
    let capture = |re: &Regex| {
        re.captures(&decoded)
            .map(|caps| caps[1].trim().to_string())
            .filter(|value| !value.is_empty())
    };

    Unsubscribe {
        mail_to: capture(&UNSUB_MAILTO),
        http_url: capture(&UNSUB_HTTP),
    }
}

/// `default_url` with a fresh random `q` parameter, for issues that have no
/// recoverable web URL.
pub fn generate_unique_url(default_url: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match Url::parse(default_url) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("q", &token);
            url.into()
        }
        Err(e) => {
            warn!("default url {default_url} is invalid ({e}), using {DEFAULT_NEWSLETTER_URL}");
            format!("{DEFAULT_NEWSLETTER_URL}?q={token}")
        }
    }
}

/// Strip the angle brackets of a header token, e.g. a `List-Post` value of
/// `<https://writer.substack.com/p/issue>`.
pub fn angle_token(header: &str) -> Option<String> {
    let value = match ANGLE_TOKEN.captures(header) {
        Some(caps) => caps[1].trim().to_string(),
        None => header.trim().to_string(),
    };
    (!value.is_empty()).then_some(value)
}

/// Follow a "read online" link through one tracking redirect.
///
/// The link comes from email content, so it must pass the safety gate before
/// it is requested at all. The redirect is read from the `Location` header of
/// a HEAD request; when there is none, or the request fails, the link itself
/// is the best URL available.
pub async fn find_newsletter_url(href: &str) -> Option<String> {
    if let Err(e) = validate_url(href) {
        warn!("refusing to follow newsletter link {href}: {e}");
        return None;
    }

    match head_location(href).await {
        Ok(Some(location)) => Some(location.into()),
        Ok(None) => Some(href.to_string()),
        Err(e) => {
            debug!("could not follow newsletter link {href}: {e}");
            Some(href.to_string())
        }
    }
}

/// Build the final result for an email a handler classified as a newsletter.
pub async fn build_newsletter_result(
    classifier: &dyn NewsletterClassifier,
    input: &NewsletterInput,
) -> Result<NewsletterResult> {
    for (field, value) in [
        ("from", &input.from),
        ("to", &input.to),
        ("subject", &input.subject),
        ("html", &input.html),
    ] {
        if value.trim().is_empty() {
            bail!("invalid newsletter email: missing {field}");
        }
    }

    let recovered = classifier
        .parse_newsletter_url(&input.headers, &input.html)
        .await?;

    let url = match recovered.map(|url| url.trim().to_string()) {
        Some(url) => match validate_url(&url) {
            Ok(_) => url,
            Err(e) => {
                warn!("discarding recovered newsletter url {url}: {e}");
                generate_unique_url(classifier.default_url())
            }
        },
        None => generate_unique_url(classifier.default_url()),
    };

    let unsubscribe = input
        .headers
        .get("list-unsubscribe")
        .map(|header| parse_unsubscribe(&header))
        .unwrap_or_default();

    Ok(NewsletterResult {
        email: input.to.clone(),
        content: input.html.clone(),
        url,
        title: input.subject.clone(),
        author: parse_author(&input.from),
        unsub_mail_to: unsubscribe.mail_to.unwrap_or_default(),
        unsub_http_url: unsubscribe.http_url.unwrap_or_default(),
    })
}
