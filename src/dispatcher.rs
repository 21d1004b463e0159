//! Entry points that walk the handler registry.
//!
//! Each entry point scans its list in registry order and hands the work to
//! the first handler whose predicate matches. Predicates run behind a guard:
//! a predicate error is logged and counts as "no match", so one broken
//! handler cannot take the whole registry down. Action errors follow the
//! phase rules: a failed resolve is logged and the original URL kept; a
//! failed pre-handle, pre-parse or newsletter extraction is returned to the
//! caller.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::dom::Document;
use crate::fetcher::FetchError;
use crate::handler::{Handler, NewsletterInput, NewsletterResult, PreHandleResult};
use crate::newsletter::build_newsletter_result;
use crate::registry::HandlerRegistry;
use crate::safety::validate_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    PreHandle,
    PreParse,
    Newsletter,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Resolve => "resolve",
            Phase::PreHandle => "pre-handle",
            Phase::PreParse => "pre-parse",
            Phase::Newsletter => "newsletter",
        })
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    /// Never returned to callers; logged and the original URL kept.
    #[error("handler {handler} failed to resolve {url}: {source:#}")]
    Resolve {
        handler: &'static str,
        url: String,
        source: anyhow::Error,
    },

    #[error("handler {handler} failed during {phase}: {source:#}")]
    Execution {
        handler: &'static str,
        phase: Phase,
        source: anyhow::Error,
    },
}

impl DispatchError {
    pub fn handler(&self) -> &'static str {
        match self {
            Self::Resolve { handler, .. } | Self::Execution { handler, .. } => handler,
        }
    }

    /// Whether retrying the item later could succeed: true when the handler
    /// failed on a transient HTTP error.
    pub fn should_retry(&self) -> bool {
        let source = match self {
            Self::Resolve { source, .. } | Self::Execution { source, .. } => source,
        };
        source
            .chain()
            .find_map(|cause| cause.downcast_ref::<FetchError>())
            .is_some_and(FetchError::should_retry)
    }
}

async fn guard<F>(handler: &Handler, phase: Phase, predicate: F) -> bool
where
    F: Future<Output = anyhow::Result<bool>>,
{
    match predicate.await {
        Ok(matched) => matched,
        Err(e) => {
            warn!(
                handler = handler.name(),
                %phase,
                "predicate failed, skipping handler: {e:#}"
            );
            false
        }
    }
}

/// Resolve, validate and pre-handle a URL before the generic fetch.
///
/// At most one resolver runs. Its result replaces the working URL only if it
/// passes the safety gate. Then the first matching pre-handler produces the
/// result. When the URL was resolved, the result always carries the
/// resolved URL so the caller never fetches the unvalidated original.
///
/// `Ok(None)` means no handler claimed the URL: fetch it generically.
#[instrument(skip_all, fields(url = %url))]
pub async fn pre_handle_content(
    registry: &HandlerRegistry,
    url: &str,
) -> Result<Option<PreHandleResult>, DispatchError> {
    let resolved = resolve_url(registry, url).await;
    let working_url = resolved.as_deref().unwrap_or(url);

    for handler in registry.content_handlers() {
        let Some(pre_handler) = handler.pre_handler() else {
            continue;
        };
        if !guard(handler, Phase::PreHandle, pre_handler.should_pre_handle(working_url)).await {
            continue;
        }

        info!(handler = handler.name(), url = working_url, "pre-handling content");
        let mut result = pre_handler
            .pre_handle(working_url)
            .await
            .map_err(|source| DispatchError::Execution {
                handler: handler.name(),
                phase: Phase::PreHandle,
                source,
            })?;

        if result.url.is_none() {
            result.url = resolved;
        }
        return Ok(Some(result));
    }

    Ok(resolved.map(|url| PreHandleResult {
        url: Some(url),
        ..Default::default()
    }))
}

/// Run the resolve phase. Returns the new working URL when one was produced
/// and passed validation.
async fn resolve_url(registry: &HandlerRegistry, url: &str) -> Option<String> {
    for handler in registry.content_handlers() {
        let Some(resolver) = handler.resolver() else {
            continue;
        };
        if !guard(handler, Phase::Resolve, resolver.should_resolve(url)).await {
            continue;
        }

        debug!(handler = handler.name(), "resolving url");
        // Only the first matching resolver is tried, whatever its outcome.
        return match resolver.resolve(url).await {
            Ok(Some(candidate)) if candidate != url => match validate_url(&candidate) {
                Ok(_) => {
                    info!(handler = handler.name(), from = url, to = %candidate, "resolved url");
                    Some(candidate)
                }
                Err(e) => {
                    warn!(
                        handler = handler.name(),
                        "discarding resolved url {candidate}: {e}"
                    );
                    None
                }
            },
            Ok(_) => None,
            Err(source) => {
                let err = DispatchError::Resolve {
                    handler: handler.name(),
                    url: url.to_string(),
                    source,
                };
                warn!(retriable = err.should_retry(), "{err}");
                None
            }
        };
    }
    None
}

/// Let the first matching pre-parser reshape a fetched document.
///
/// `Ok(None)` means no handler claimed the document: use it as fetched.
#[instrument(skip_all, fields(url = %url))]
pub async fn pre_parse_content(
    registry: &HandlerRegistry,
    url: &str,
    dom: Document,
) -> Result<Option<Document>, DispatchError> {
    for handler in registry.content_handlers() {
        let Some(pre_parser) = handler.pre_parser() else {
            continue;
        };
        if !guard(handler, Phase::PreParse, pre_parser.should_pre_parse(url, &dom)).await {
            continue;
        }

        info!(handler = handler.name(), "pre-parsing content");
        return pre_parser
            .pre_parse(url, dom)
            .await
            .map(Some)
            .map_err(|source| DispatchError::Execution {
                handler: handler.name(),
                phase: Phase::PreParse,
                source,
            });
    }
    Ok(None)
}

/// First newsletter handler that classifies the email as its own.
#[instrument(skip_all, fields(from = %input.from))]
pub async fn get_newsletter_handler(
    registry: &HandlerRegistry,
    input: &NewsletterInput,
) -> Option<Arc<Handler>> {
    for handler in registry.newsletter_handlers() {
        let Some(classifier) = handler.newsletter() else {
            continue;
        };
        if guard(handler, Phase::Newsletter, classifier.is_newsletter(input)).await {
            debug!(handler = handler.name(), "classified newsletter");
            return Some(Arc::clone(handler));
        }
    }
    None
}

/// Classify an inbound email and extract its newsletter metadata.
///
/// `Ok(None)` means the email is not a newsletter.
#[instrument(skip_all, fields(from = %input.from))]
pub async fn handle_newsletter(
    registry: &HandlerRegistry,
    input: &NewsletterInput,
) -> Result<Option<NewsletterResult>, DispatchError> {
    let Some(handler) = get_newsletter_handler(registry, input).await else {
        debug!("not a newsletter");
        return Ok(None);
    };
    let Some(classifier) = handler.newsletter() else {
        return Ok(None);
    };

    info!(handler = handler.name(), "handling newsletter");
    build_newsletter_result(classifier, input)
        .await
        .map(Some)
        .map_err(|source| DispatchError::Execution {
            handler: handler.name(),
            phase: Phase::Newsletter,
            source,
        })
}
