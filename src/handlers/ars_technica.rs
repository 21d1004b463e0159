//! Ars Technica splits long features over several pages. Fetch them all and
//! fold every page's article body into the first one.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use kuchiki::traits::TendrilSink;
use scraper::Selector;
use tracing::{debug, warn};
use url::Url;

use super::host_matches;
use crate::dom::{Document, remove_all};
use crate::fetcher::fetch_page;
use crate::handler::{Handler, PreHandleResult, PreHandler};

const ARTICLE_BODY: &str = ".article-content";
const PAGER: &str = "nav.page-numbers";
const MAX_EXTRA_PAGES: usize = 10;

pub struct ArsTechnicaHandler;

#[async_trait]
impl PreHandler for ArsTechnicaHandler {
    async fn should_pre_handle(&self, url: &str) -> Result<bool> {
        Ok(host_matches(url, &["arstechnica.com"]))
    }

    async fn pre_handle(&self, url: &str) -> Result<PreHandleResult> {
        let first = fetch_page(url)
            .await
            .context("failed to fetch first article page")?;
        let dom = Document::parse(first.body);
        let pages = other_pages(&dom, &first.url_final);
        debug!(pages = pages.len() + 1, "unfurling article");

        let mut bodies = Vec::with_capacity(pages.len());
        for page_url in pages {
            match fetch_page(page_url.as_str()).await {
                Ok(page) => {
                    if let Some(body) = article_body(&Document::parse(page.body)) {
                        bodies.push(body);
                    }
                }
                Err(e) => {
                    // a partial article still beats none
                    warn!(page = %page_url, "skipping article page: {e}");
                }
            }
        }

        let dom = if bodies.is_empty() {
            dom
        } else {
            merge_pages(dom, &bodies)?
        };
        Ok(PreHandleResult {
            title: dom.title(),
            content: Some(dom.into_html()),
            ..Default::default()
        })
    }
}

/// Same-host pager links other than the page itself, in order, deduplicated.
fn other_pages(dom: &Document, base: &Url) -> Vec<Url> {
    let Ok(links) = Selector::parse(&format!("{PAGER} a[href]")) else {
        return Vec::new();
    };

    let mut pages: Vec<Url> = Vec::new();
    let hrefs: Vec<String> = dom.with_tree(|tree| {
        tree.select(&links)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect()
    });

    for href in hrefs {
        let Ok(mut page) = base.join(&href) else {
            continue;
        };
        page.set_fragment(None);
        if page.host_str() != base.host_str() || same_page(&page, base) {
            continue;
        }
        if !pages.iter().any(|seen| same_page(seen, &page)) {
            pages.push(page);
        }
    }
    pages.truncate(MAX_EXTRA_PAGES);
    pages
}

fn same_page(a: &Url, b: &Url) -> bool {
    a.path().trim_end_matches('/') == b.path().trim_end_matches('/') && a.query() == b.query()
}

fn article_body(dom: &Document) -> Option<String> {
    let selector = Selector::parse(ARTICLE_BODY).ok()?;
    dom.with_tree(|tree| tree.select(&selector).next().map(|el| el.inner_html()))
}

/// Append `bodies` to the first page's article body and drop the pager.
fn merge_pages(dom: Document, bodies: &[String]) -> Result<Document> {
    dom.edit(|root| {
        let target = root
            .select_first(ARTICLE_BODY)
            .map_err(|()| anyhow!("article page has no {ARTICLE_BODY}"))?;

        for body in bodies {
            let fragment = kuchiki::parse_html().one(body.as_str());
            let Ok(parsed_body) = fragment.select_first("body") else {
                continue;
            };
            let children: Vec<_> = parsed_body.as_node().children().collect();
            for child in children {
                target.as_node().append(child);
            }
        }

        remove_all(root, PAGER)?;
        Ok(())
    })
}

pub fn handler() -> Handler {
    Handler::new("ars_technica").with_pre_handler(ArsTechnicaHandler)
}
