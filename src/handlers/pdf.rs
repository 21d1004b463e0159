//! PDF links skip HTML extraction entirely.

use anyhow::Result;
use async_trait::async_trait;

use super::path_of;
use crate::handler::{Handler, PreHandleResult, PreHandler};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub struct PdfHandler;

#[async_trait]
impl PreHandler for PdfHandler {
    async fn should_pre_handle(&self, url: &str) -> Result<bool> {
        Ok(path_of(url).is_some_and(|path| path.ends_with(".pdf")))
    }

    async fn pre_handle(&self, _url: &str) -> Result<PreHandleResult> {
        Ok(PreHandleResult {
            content_type: Some(PDF_CONTENT_TYPE.to_string()),
            ..Default::default()
        })
    }
}

pub fn handler() -> Handler {
    Handler::new("pdf").with_pre_handler(PdfHandler)
}
