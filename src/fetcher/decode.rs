use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

use crate::fetcher::errors::FetchError;

/// Bytes of the body inspected for an in-document charset declaration.
const SNIFF_LEN: usize = 4096;

static HEADER_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>;]+)"#).unwrap());

/// Decode a response body to UTF-8.
///
/// The charset comes from the `Content-Type` header, then from a `<meta>`
/// declaration near the top of the document (covers both `charset=` and
/// `http-equiv` forms), then from statistical detection.
pub fn decode_body(content_type: &str, body: &[u8]) -> Result<(String, &'static str), FetchError> {
    let encoding = detect_encoding(content_type, body);
    let (decoded, used, had_errors) = encoding.decode(body);

    if had_errors && used != encoding_rs::UTF_8 {
        return Err(FetchError::Charset(format!(
            "failed to decode content as {}",
            used.name()
        )));
    }

    Ok((decoded.into_owned(), used.name()))
}

fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    if let Some(encoding) = label_from(&HEADER_CHARSET, content_type) {
        return encoding;
    }

    let head = &body[..body.len().min(SNIFF_LEN)];
    let head_text = String::from_utf8_lossy(head);
    if let Some(encoding) = label_from(&META_CHARSET, &head_text) {
        return encoding;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, body.len() <= SNIFF_LEN);
    detector.guess(None, true)
}

fn label_from(re: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = re.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}
