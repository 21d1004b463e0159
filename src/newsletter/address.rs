//! Author names from `From` headers.

use mailparse::{MailAddr, addrparse_header, parse_header};
use regex::Regex;
use std::sync::LazyLock;

use crate::newsletter::rfc2047::decode_words;

// "mike@axios.com (Mike Allen)"
static COMMENT_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*[^\s<>()",;:]+@[^\s<>()",;:]+\s*\(([^()]*)\)\s*$"#).unwrap()
});

/// Display name of the first mailbox in a `From` header.
///
/// `"Mike Allen <mike@axios.com>"` gives `"Mike Allen"`, and the legacy
/// `"mike@axios.com (Mike Allen)"` form gives the comment. Group syntax is
/// looked through to its first member. When the first mailbox carries no
/// name the header is returned verbatim.
pub fn parse_author(from: &str) -> String {
    let name = match COMMENT_FORM.captures(from) {
        Some(caps) => decode_words(&caps[1]),
        None => first_display_name(from).unwrap_or_default(),
    };

    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        from.to_string()
    } else {
        name
    }
}

fn first_display_name(from: &str) -> Option<String> {
    let line = format!("From: {}", from.replace(['\r', '\n'], " "));
    let (header, _) = parse_header(line.as_bytes()).ok()?;
    let addresses = addrparse_header(&header).ok()?;

    addresses
        .iter()
        .find_map(|address| match address {
            MailAddr::Single(mailbox) => Some(mailbox.display_name.clone()),
            MailAddr::Group(group) => group.addrs.first().map(|m| m.display_name.clone()),
        })
        .flatten()
}
