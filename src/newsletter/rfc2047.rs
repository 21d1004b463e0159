//! RFC 2047 encoded-word decoding for mail header values.

use mailparse::parse_header;

/// Decode every encoded-word in `input`.
///
/// Whitespace between two adjacent encoded-words is dropped. Folded input is
/// unfolded first, so the result is always a single line.
pub fn decode_words(input: &str) -> String {
    let line = format!("X-Triage: {}", input.replace(['\r', '\n'], " "));
    match parse_header(line.as_bytes()) {
        Ok((header, _)) => header.get_value(),
        Err(_) => input.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_word() {
        assert_eq!(decode_words("=?UTF-8?B?SGVsbG8sIFdvcmxkIQ==?="), "Hello, World!");
    }

    #[test]
    fn decodes_q_word_in_legacy_charset() {
        assert_eq!(
            decode_words("=?ISO-8859-1?Q?Caf=E9_au_lait?="),
            "Café au lait"
        );
    }

    #[test]
    fn joins_adjacent_words_and_keeps_plain_text() {
        assert_eq!(
            decode_words("Re: =?UTF-8?Q?caf?=  =?UTF-8?Q?=C3=A9?= time"),
            "Re: café time"
        );
    }

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(
            decode_words("<mailto:unsub@list.test>, <https://list.test/u>"),
            "<mailto:unsub@list.test>, <https://list.test/u>"
        );
    }

    #[test]
    fn signed_q_escape_is_not_a_byte() {
        let decoded = decode_words("=?UTF-8?Q?a=+4?=");
        assert!(!decoded.contains('\u{4}'), "{decoded:?}");
        assert!(decoded.contains("=+4"), "{decoded:?}");
    }

    #[test]
    fn folded_values_are_unfolded() {
        assert_eq!(
            decode_words("=?UTF-8?Q?Morning?=\r\n =?UTF-8?Q?_Brew?="),
            "Morning Brew"
        );
    }
}
