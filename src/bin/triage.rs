use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;
use triage::{
    Document, NewsletterInput, PreHandleResult, default_registry, fetcher::fetch_page, handle_newsletter,
    pre_handle_content, pre_parse_content,
};

const USAGE: &str = "usage: triage url <URL> | triage newsletter <EMAIL.json>";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (Some("url"), Some(url)) => inspect_url(&url).await,
        (Some("newsletter"), Some(path)) => inspect_newsletter(PathBuf::from(path)).await,
        _ => bail!(USAGE),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Run the content pipeline up to extraction and print what it produced.
async fn inspect_url(url: &str) -> Result<()> {
    let registry = default_registry();
    let pre_handled = pre_handle_content(registry, url).await?;

    if needs_fetch(pre_handled.as_ref()) {
        let target = pre_handled
            .as_ref()
            .and_then(|r| r.url.clone())
            .unwrap_or_else(|| url.to_string());
        let page = fetch_page(&target)
            .await
            .with_context(|| format!("failed to fetch {target}"))?;
        let dom = Document::parse(page.body);
        let dom = pre_parse_content(registry, page.url_final.as_str(), dom.clone())
            .await?
            .unwrap_or(dom);

        let mut result = pre_handled.unwrap_or_default();
        result.url.get_or_insert_with(|| page.url_final.to_string());
        result.title = result.title.or_else(|| dom.title());
        result.dom = Some(dom);
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&pre_handled)?);
    Ok(())
}

/// Whether the page still has to be fetched and pre-parsed. A handler that
/// supplied the content, or flagged a non-HTML document, has the last word.
fn needs_fetch(pre_handled: Option<&PreHandleResult>) -> bool {
    let Some(result) = pre_handled else {
        return true;
    };
    if result.content.is_some() {
        return false;
    }
    result.content_type.as_deref().is_none_or(is_html)
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("text/html") || mime.eq_ignore_ascii_case("application/xhtml+xml")
}

async fn inspect_newsletter(path: PathBuf) -> Result<()> {
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let input: NewsletterInput =
        serde_json::from_str(&raw).context("email file is not a newsletter input document")?;

    match handle_newsletter(default_registry(), &input).await? {
        Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        None => println!("not a newsletter"),
    }
    Ok(())
}
