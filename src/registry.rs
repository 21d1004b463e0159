//! The ordered handler lists the dispatcher walks.
//!
//! Order is behaviour: the first handler whose predicate matches wins. The
//! lists are fixed once built; there is no insert or remove.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::handler::Handler;
use crate::handlers::{
    apple_news, ars_technica, axios, beehiiv, convertkit, generic, ghost, image, medium, pdf,
    scraping_service, sender_pattern, short_link, substack, twitter, weixin, wikipedia, youtube,
};

static DEFAULT_REGISTRY: Lazy<HandlerRegistry> = Lazy::new(HandlerRegistry::standard);

/// The process-wide standard registry, built on first use.
pub fn default_registry() -> &'static HandlerRegistry {
    &DEFAULT_REGISTRY
}

#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    content: Vec<Arc<Handler>>,
    newsletters: Vec<Arc<Handler>>,
}

impl HandlerRegistry {
    pub fn new(content: Vec<Arc<Handler>>, newsletters: Vec<Arc<Handler>>) -> Self {
        Self {
            content,
            newsletters,
        }
    }

    /// Every built-in handler, in dispatch order.
    pub fn standard() -> Self {
        let substack = Arc::new(substack::handler());
        let axios = Arc::new(axios::handler());

        let content = vec![
            // Resolution first, so every later predicate sees the real URL.
            Arc::new(short_link::handler()),
            Arc::new(apple_news::handler()),
            Arc::new(twitter::handler()),
            Arc::new(youtube::handler()),
            Arc::new(medium::handler()),
            Arc::new(wikipedia::handler()),
            Arc::new(ars_technica::handler()),
            Arc::new(image::handler()),
            Arc::new(pdf::handler()),
            Arc::clone(&substack),
            Arc::clone(&axios),
            Arc::new(weixin::handler()),
            // Broad host list, must stay behind every site-specific handler.
            Arc::new(scraping_service::handler()),
        ];

        let newsletters = vec![
            substack,
            Arc::new(beehiiv::handler()),
            Arc::new(convertkit::handler()),
            Arc::new(ghost::handler()),
            axios,
            Arc::new(sender_pattern::morning_brew()),
            Arc::new(sender_pattern::cooper_press()),
            Arc::new(sender_pattern::bloomberg()),
            // Matches any mailing list.
            Arc::new(generic::handler()),
        ];

        Self::new(content, newsletters)
    }

    /// Handlers consulted for URL resolution, pre-handling and pre-parsing.
    pub fn content_handlers(&self) -> &[Arc<Handler>] {
        &self.content
    }

    /// Handlers consulted for newsletter classification.
    pub fn newsletter_handlers(&self) -> &[Arc<Handler>] {
        &self.newsletters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(handlers: &[Arc<Handler>]) -> Vec<&'static str> {
        handlers.iter().map(|h| h.name()).collect()
    }

    #[test]
    fn standard_content_order() {
        let registry = HandlerRegistry::standard();
        assert_eq!(
            names(registry.content_handlers()),
            vec![
                "short_link",
                "apple_news",
                "twitter",
                "youtube",
                "medium",
                "wikipedia",
                "ars_technica",
                "image",
                "pdf",
                "substack",
                "axios",
                "weixin",
                "scraping_service",
            ]
        );
    }

    #[test]
    fn standard_newsletter_order() {
        let registry = HandlerRegistry::standard();
        assert_eq!(
            names(registry.newsletter_handlers()),
            vec![
                "substack",
                "beehiiv",
                "convertkit",
                "ghost",
                "axios",
                "morning_brew",
                "cooper_press",
                "bloomberg",
                "generic",
            ]
        );
    }

    #[test]
    fn every_handler_has_its_capability() {
        let registry = HandlerRegistry::standard();
        for handler in registry.newsletter_handlers() {
            assert!(handler.newsletter().is_some(), "{}", handler.name());
        }
        for handler in registry.content_handlers() {
            assert!(
                handler.resolver().is_some()
                    || handler.pre_handler().is_some()
                    || handler.pre_parser().is_some(),
                "{}",
                handler.name()
            );
        }
    }

    #[test]
    fn dual_role_handlers_are_shared() {
        let registry = HandlerRegistry::standard();
        let find = |list: &[Arc<Handler>], name: &str| {
            list.iter().find(|h| h.name() == name).cloned().unwrap()
        };
        for name in ["substack", "axios"] {
            assert!(Arc::ptr_eq(
                &find(registry.content_handlers(), name),
                &find(registry.newsletter_handlers(), name)
            ));
        }
    }

    #[test]
    fn default_registry_is_built_once() {
        assert!(std::ptr::eq(default_registry(), default_registry()));
    }
}
