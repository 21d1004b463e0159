use crate::fetcher::{decode::decode_body, errors::FetchError, types::FetchedPage};
use chrono::Utc;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = "TriageBot/0.1 (+https://triage.example.com)";
const HEAD_TIMEOUT: Duration = Duration::from_secs(5);

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("Failed to build HTTP client")
});

// Redirects are read, never followed: tracking links and shorteners are
// resolved one hop at a time so every hop can be validated by the caller.
static NO_REDIRECT_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(HEAD_TIMEOUT)
        .timeout(HEAD_TIMEOUT)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build no-redirect HTTP client")
});

pub fn get_client() -> &'static Client {
    &HTTP_CLIENT
}

/// GET an HTML page and decode it to UTF-8.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_page(url: &str) -> Result<FetchedPage, FetchError> {
    fetch_page_with(url, None).await
}

/// Like [`fetch_page`], overriding the User-Agent for sites that serve a
/// different document to mobile clients.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_page_as(url: &str, user_agent: &str) -> Result<FetchedPage, FetchError> {
    fetch_page_with(url, Some(user_agent)).await
}

async fn fetch_page_with(url: &str, user_agent: Option<&str>) -> Result<FetchedPage, FetchError> {
    let parsed_url = Url::parse(url)?;

    let mut request = HTTP_CLIENT.get(parsed_url).header(
        header::ACCEPT,
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    );
    if let Some(user_agent) = user_agent {
        request = request.header(header::USER_AGENT, user_agent);
    }

    let response = request
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    // Check content length before downloading
    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let url_final = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::from_status(status));
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return Err(FetchError::UnsupportedContentType(content_type));
    }

    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Io(e.to_string()))?;

    // Content-Length may have been missing
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
    }

    let (body, charset) = decode_body(&content_type, &body_bytes)?;

    Ok(FetchedPage {
        url_final,
        status,
        content_type,
        charset,
        body,
        fetched_at: Utc::now(),
    })
}

/// GET a JSON document, optionally authenticated with a bearer token.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_json<T: DeserializeOwned>(
    url: &str,
    bearer_token: Option<&str>,
) -> Result<T, FetchError> {
    let parsed_url = Url::parse(url)?;

    let mut request = HTTP_CLIENT
        .get(parsed_url)
        .header(header::ACCEPT, "application/json");
    if let Some(token) = bearer_token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::from_status(status));
    }

    response.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::from_reqwest_error(e)
        }
    })
}

/// HEAD a URL without following redirects and return where it points.
///
/// Returns the `Location` target, resolved against `url`, when the response
/// is a redirect. Any other successful exchange yields `None`.
#[instrument(skip_all, fields(url = %url))]
pub async fn head_location(url: &str) -> Result<Option<Url>, FetchError> {
    let parsed_url = Url::parse(url)?;

    let response = NO_REDIRECT_CLIENT
        .head(parsed_url.clone())
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    let status = response.status();
    if !status.is_redirection() {
        debug!(%status, "no redirect");
        return Ok(None);
    }

    let Some(location) = response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
    else {
        debug!(%status, "redirect without location header");
        return Ok(None);
    };

    Ok(Some(parsed_url.join(location.trim())?))
}
