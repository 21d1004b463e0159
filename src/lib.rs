//! Content triage: decides, per saved URL or inbound newsletter email, how
//! to fetch, reshape and classify it before generic article extraction.
//!
//! The [`registry`] holds ordered lists of site and sender [`handlers`];
//! the [`dispatcher`] walks them, first match wins. Every URL a handler
//! resolves passes the [`safety`] gate before it is used.

pub mod config;
pub mod dispatcher;
pub mod dom;
pub mod fetcher;
pub mod handler;
pub mod handlers;
pub mod newsletter;
pub mod registry;
pub mod safety;

pub use dispatcher::{
    DispatchError, Phase, get_newsletter_handler, handle_newsletter, pre_handle_content,
    pre_parse_content,
};
pub use dom::Document;
pub use handler::{
    Handler, Headers, NewsletterClassifier, NewsletterInput, NewsletterResult, PreHandleResult,
    PreHandler, PreParser, Resolver,
};
pub use registry::{HandlerRegistry, default_registry};
pub use safety::{InvalidUrlError, is_safe_url, validate_url};
