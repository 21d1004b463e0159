//! Direct image links get a minimal page around the image.

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use super::{escape, path_of};
use crate::handler::{Handler, PreHandleResult, PreHandler};

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

pub struct ImageHandler;

#[async_trait]
impl PreHandler for ImageHandler {
    async fn should_pre_handle(&self, url: &str) -> Result<bool> {
        Ok(path_of(url).is_some_and(|path| IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))))
    }

    async fn pre_handle(&self, url: &str) -> Result<PreHandleResult> {
        let title = file_name(url).unwrap_or_else(|| url.to_string());
        let src = escape(url);
        let alt = escape(&title);
        let content = format!(
            r#"<html><head><title>{alt}</title><meta property="og:image" content="{src}"><meta property="og:title" content="{alt}"></head><body><div><img src="{src}" alt="{alt}"></div></body></html>"#
        );

        Ok(PreHandleResult {
            url: Some(url.to_string()),
            title: Some(title),
            content: Some(content),
            ..Default::default()
        })
    }
}

fn file_name(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .path_segments()?
        .next_back()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

pub fn handler() -> Handler {
    Handler::new("image").with_pre_handler(ImageHandler)
}
