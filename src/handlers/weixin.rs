//! WeChat official account articles (`mp.weixin.qq.com`).

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::host_of;
use crate::dom::{Document, remove_all};
use crate::handler::{Handler, PreParser};

// QR codes, account profile card and the "read more" footer.
const CHROME: &[&str] = &[
    ".profile_container",
    "#js_profile_qrcode",
    "#js_pc_qr_code",
    ".qr_code_pc_outer",
    "#content_bottom_area",
    ".rich_media_area_extra",
];

pub struct WeixinHandler;

#[async_trait]
impl PreParser for WeixinHandler {
    async fn should_pre_parse(&self, url: &str, _dom: &Document) -> Result<bool> {
        Ok(host_of(url).as_deref() == Some("mp.weixin.qq.com"))
    }

    async fn pre_parse(&self, _url: &str, dom: Document) -> Result<Document> {
        dom.edit(|root| {
            // images are lazy-loaded from data-src
            for img in root
                .select("img[data-src]")
                .map_err(|()| anyhow!("invalid image selector"))?
            {
                let mut attributes = img.attributes.borrow_mut();
                if let Some(src) = attributes.get("data-src").map(str::to_string) {
                    attributes.insert("src", src);
                }
            }
            for selector in CHROME {
                remove_all(root, selector)?;
            }
            Ok(())
        })
    }
}

pub fn handler() -> Handler {
    Handler::new("weixin").with_pre_parser(WeixinHandler)
}
