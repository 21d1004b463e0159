use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use url::Url;

/// An HTML page fetched on behalf of a handler, decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url_final: Url,
    pub status: StatusCode,
    pub content_type: String,
    /// Name of the charset the body was decoded from.
    pub charset: &'static str,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}
