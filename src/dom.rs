//! Owned HTML document passed between the fetch step and pre-parse handlers.
//!
//! A [`Document`] keeps its serialized markup, which keeps it `Send` across
//! handler `.await` points. Read-only queries parse with `scraper`; mutations
//! parse with `kuchiki`, edit the tree in place and serialize back. Handlers
//! receive a `Document` by value and hand it back, so none can hold on to it
//! after its call returns.

use anyhow::{Result, anyhow};
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    html: String,
}

/// An anchor found by [`Document::anchors`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub href: Option<String>,
}

impl Document {
    pub fn parse(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    /// Run several queries against one parsed tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&Html) -> R) -> R {
        let tree = Html::parse_document(&self.html);
        f(&tree)
    }

    pub fn exists(&self, selector: &str) -> bool {
        let Some(selector) = compile(selector) else {
            return false;
        };
        self.with_tree(|tree| tree.select(&selector).next().is_some())
    }

    /// Attribute value of the first element matching `selector`.
    pub fn select_attr(&self, selector: &str, attr: &str) -> Option<String> {
        let selector = compile(selector)?;
        self.with_tree(|tree| {
            tree.select(&selector)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(str::to_string)
        })
    }

    /// Trimmed text content of the first element matching `selector`.
    pub fn select_text(&self, selector: &str) -> Option<String> {
        let selector = compile(selector)?;
        self.with_tree(|tree| tree.select(&selector).next().map(|el| element_text(&el)))
    }

    /// Every element matching `selector`, as text plus `href`.
    pub fn anchors(&self, selector: &str) -> Vec<Anchor> {
        let Some(selector) = compile(selector) else {
            return Vec::new();
        };
        self.with_tree(|tree| {
            tree.select(&selector)
                .map(|el| Anchor {
                    text: element_text(&el),
                    href: el.value().attr("href").map(str::to_string),
                })
                .collect()
        })
    }

    /// Document title, from `<title>` or the `og:title` meta tag.
    pub fn title(&self) -> Option<String> {
        self.select_text("title")
            .filter(|title| !title.is_empty())
            .or_else(|| self.select_attr("meta[property='og:title']", "content"))
    }

    /// Mutate the document through a `kuchiki` tree rooted at the document
    /// node, then re-serialize it.
    pub fn edit<F>(self, f: F) -> Result<Self>
    where
        F: FnOnce(&NodeRef) -> Result<()>,
    {
        let root = kuchiki::parse_html().one(self.html);
        f(&root)?;
        Ok(Self {
            html: root.to_string(),
        })
    }

    /// Detach every element matching any of `selectors`.
    pub fn remove(self, selectors: &[&str]) -> Result<Self> {
        self.edit(|root| {
            for selector in selectors {
                remove_all(root, selector)?;
            }
            Ok(())
        })
    }
}

/// Detach every descendant of `root` matching `selector`. Returns how many
/// elements were removed.
pub fn remove_all(root: &NodeRef, selector: &str) -> Result<usize> {
    let matches: Vec<_> = root
        .select(selector)
        .map_err(|()| anyhow!("invalid selector: {selector}"))?
        .collect();
    for el in &matches {
        el.as_node().detach();
    }
    Ok(matches.len())
}

/// Collapsed whitespace text of an element.
pub fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("invalid selector {selector}: {e}");
            None
        }
    }
}
