//! The handler contract.
//!
//! A [`Handler`] is a named record of optional capabilities. Each capability
//! is its own trait with a predicate and an action; a handler opts in to a
//! capability by carrying an implementation of it. The dispatcher only
//! consults capabilities that are present, so "not implemented" is `None`
//! rather than an inherited no-op.
//!
//! All predicates and actions are async, even where an implementation is
//! plain string matching, so the dispatcher loop treats every handler alike.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dom::Document;
use crate::newsletter;

/// URL shortener / redirect expansion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn should_resolve(&self, url: &str) -> Result<bool>;

    /// Expanded URL, or `None` when there is nothing to expand to.
    async fn resolve(&self, url: &str) -> Result<Option<String>>;
}

/// Replaces the generic fetch step for matching URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreHandler: Send + Sync {
    async fn should_pre_handle(&self, url: &str) -> Result<bool>;

    async fn pre_handle(&self, url: &str) -> Result<PreHandleResult>;
}

/// Reshapes an already fetched document before extraction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreParser: Send + Sync {
    async fn should_pre_parse(&self, url: &str, dom: &Document) -> Result<bool>;

    /// Perform every transformation this handler needs in one call; the
    /// dispatcher runs at most one pre-parser per document.
    async fn pre_parse(&self, url: &str, dom: Document) -> Result<Document>;
}

/// Newsletter classification and canonical URL recovery.
#[async_trait]
pub trait NewsletterClassifier: Send + Sync {
    async fn is_newsletter(&self, input: &NewsletterInput) -> Result<bool>;

    /// Canonical web URL of the newsletter issue, if one can be recovered.
    ///
    /// Defaults to the "read online" link found by
    /// [`find_newsletter_header_href`](Self::find_newsletter_header_href),
    /// followed through one tracking redirect.
    async fn parse_newsletter_url(&self, _headers: &Headers, html: &str) -> Result<Option<String>> {
        let href = self.find_newsletter_header_href(&Document::parse(html));
        match href {
            Some(href) => Ok(newsletter::find_newsletter_url(&href).await),
            None => Ok(None),
        }
    }

    /// The sender-specific "read online" link in the email body.
    fn find_newsletter_header_href(&self, _dom: &Document) -> Option<String> {
        None
    }

    /// Base of the synthesized URL used when no canonical URL is recovered.
    fn default_url(&self) -> &str {
        newsletter::DEFAULT_NEWSLETTER_URL
    }
}

/// A named site or sender strategy.
pub struct Handler {
    name: &'static str,
    resolver: Option<Arc<dyn Resolver>>,
    pre_handler: Option<Arc<dyn PreHandler>>,
    pre_parser: Option<Arc<dyn PreParser>>,
    newsletter: Option<Arc<dyn NewsletterClassifier>>,
}

impl Handler {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            resolver: None,
            pre_handler: None,
            pre_parser: None,
            newsletter: None,
        }
    }

    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_pre_handler(mut self, pre_handler: impl PreHandler + 'static) -> Self {
        self.pre_handler = Some(Arc::new(pre_handler));
        self
    }

    pub fn with_pre_parser(mut self, pre_parser: impl PreParser + 'static) -> Self {
        self.pre_parser = Some(Arc::new(pre_parser));
        self
    }

    pub fn with_newsletter(mut self, classifier: impl NewsletterClassifier + 'static) -> Self {
        self.newsletter = Some(Arc::new(classifier));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn resolver(&self) -> Option<&dyn Resolver> {
        self.resolver.as_deref()
    }

    pub fn pre_handler(&self) -> Option<&dyn PreHandler> {
        self.pre_handler.as_deref()
    }

    pub fn pre_parser(&self) -> Option<&dyn PreParser> {
        self.pre_parser.as_deref()
    }

    pub fn newsletter(&self) -> Option<&dyn NewsletterClassifier> {
        self.newsletter.as_deref()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("resolve", &self.resolver.is_some())
            .field("pre_handle", &self.pre_handler.is_some())
            .field("pre_parse", &self.pre_parser.is_some())
            .field("newsletter", &self.newsletter.is_some())
            .finish()
    }
}

/// What a pre-handler produced. Any subset may be set; generic extraction
/// fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreHandleResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom: Option<Document>,
}

/// A mail header value; some headers legitimately repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    One(String),
    Many(Vec<String>),
}

impl HeaderValue {
    /// Repeated values joined with `", "`.
    pub fn joined(&self) -> String {
        match self {
            HeaderValue::One(value) => value.clone(),
            HeaderValue::Many(values) => values.join(", "),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            HeaderValue::One(value) => value.trim().is_empty(),
            HeaderValue::Many(values) => values.iter().all(|v| v.trim().is_empty()),
        }
    }
}

/// Mail headers keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, HeaderValue>")]
pub struct Headers(HashMap<String, HeaderValue>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: HeaderValue) {
        self.0.insert(name.to_ascii_lowercase(), value);
    }

    /// Builder form of [`insert`](Self::insert) for a single value.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, HeaderValue::One(value.into()));
        self
    }

    /// Case-insensitive lookup; repeated values are joined.
    pub fn get(&self, name: &str) -> Option<String> {
        self.0.get(&name.to_ascii_lowercase()).map(HeaderValue::joined)
    }

    /// True when the header is present with a non-blank value.
    pub fn has(&self, name: &str) -> bool {
        self.0
            .get(&name.to_ascii_lowercase())
            .is_some_and(|value| !value.is_empty())
    }
}

impl From<HashMap<String, HeaderValue>> for Headers {
    fn from(map: HashMap<String, HeaderValue>) -> Self {
        Self(
            map.into_iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value))
                .collect(),
        )
    }
}

/// One inbound email, as handed over by mail ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterInput {
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    pub html: String,
    #[serde(default)]
    pub headers: Headers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterResult {
    pub email: String,
    pub content: String,
    pub url: String,
    pub title: String,
    pub author: String,
    pub unsub_mail_to: String,
    pub unsub_http_url: String,
}
