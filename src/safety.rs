//! SSRF gate for URLs that are about to be fetched.
//!
//! Every URL produced by a resolver, and every canonical URL recovered from a
//! newsletter, passes through [`validate_url`] before it replaces the URL the
//! pipeline will fetch.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;
use url::{Host, Url};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidUrlError {
    #[error("malformed url: {0}")]
    Malformed(#[from] url::ParseError),

    #[error("unsupported scheme: {0}")]
    Scheme(String),

    #[error("url has no host")]
    MissingHost,

    #[error("local host not allowed: {0}")]
    Localhost(String),

    #[error("private network address not allowed: {0}")]
    PrivateNetwork(IpAddr),
}

/// Check that `url` is safe to fetch from inside the service network.
///
/// Returns the parsed URL on success. Fails when the scheme is not http or
/// https, when the host is a local name, or when the host is an address in a
/// loopback, private, link-local or unspecified range. Numeric hosts in
/// shorthand forms (`http://167772165/`) are normalised by the parser first,
/// so they are caught as well.
pub fn validate_url(url: &str) -> Result<Url, InvalidUrlError> {
    let parsed = Url::parse(url.trim())?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(InvalidUrlError::Scheme(other.to_string())),
    }

    match parsed.host() {
        None => return Err(InvalidUrlError::MissingHost),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                return Err(InvalidUrlError::Localhost(domain));
            }
            // Some resolvers accept dotted quads the URL parser left as a
            // domain (e.g. with a trailing dot).
            if let Ok(ip) = domain.parse::<Ipv4Addr>() {
                check_ip(IpAddr::V4(ip))?;
            }
        }
        Some(Host::Ipv4(ip)) => check_ip(IpAddr::V4(ip))?,
        Some(Host::Ipv6(ip)) => check_ip(IpAddr::V6(ip))?,
    }

    Ok(parsed)
}

/// Boolean form of [`validate_url`].
pub fn is_safe_url(url: &str) -> bool {
    validate_url(url).is_ok()
}

fn check_ip(ip: IpAddr) -> Result<(), InvalidUrlError> {
    if ip.is_unspecified() {
        return Err(InvalidUrlError::Localhost(ip.to_string()));
    }
    if is_blocked(ip) {
        return Err(InvalidUrlError::PrivateNetwork(ip));
    }
    Ok(())
}

fn is_blocked(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return mapped.is_unspecified() || is_blocked_v4(mapped);
            }
            is_blocked_v6(v6)
        }
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    // 10/8, 172.16/12, 192.168/16
    ip.is_private() || ip.is_loopback() || ip.is_link_local()
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_public_https() {
        let url = validate_url("https://example.com/article").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert!(is_safe_url("http://news.ycombinator.com/item?id=1"));
    }

    #[test]
    fn rejects_localhost() {
        assert!(matches!(
            validate_url("http://localhost/x"),
            Err(InvalidUrlError::Localhost(_))
        ));
        assert!(matches!(
            validate_url("http://LOCALHOST.:8080/"),
            Err(InvalidUrlError::Localhost(_))
        ));
        assert!(matches!(
            validate_url("http://api.localhost/"),
            Err(InvalidUrlError::Localhost(_))
        ));
        assert!(matches!(
            validate_url("http://0.0.0.0/"),
            Err(InvalidUrlError::Localhost(_))
        ));
    }

    #[test]
    fn rejects_private_ranges() {
        for url in [
            "http://10.0.0.5/",
            "http://172.16.3.4/admin",
            "http://172.31.255.1/",
            "https://192.168.1.1/",
            "http://127.0.0.1:9000/",
            "http://169.254.169.254/latest/meta-data/",
            "http://[::1]/",
            "http://[fd00::1]/",
            "http://[fe80::1]/",
            "http://[::ffff:10.0.0.1]/",
        ] {
            assert!(
                matches!(validate_url(url), Err(InvalidUrlError::PrivateNetwork(_))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_numeric_shorthand_hosts() {
        // 167772165 == 10.0.0.5
        assert!(validate_url("http://167772165/").is_err());
        assert!(validate_url("http://0x7f.1/").is_err());
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            validate_url("ftp://example.com/"),
            Err(InvalidUrlError::Scheme(s)) if s == "ftp"
        ));
        assert!(matches!(
            validate_url("file:///etc/passwd"),
            Err(InvalidUrlError::Scheme(_))
        ));
        assert!(matches!(
            validate_url("javascript:alert(1)"),
            Err(InvalidUrlError::Scheme(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            validate_url("not a url"),
            Err(InvalidUrlError::Malformed(_))
        ));
        assert!(!is_safe_url(""));
    }

    #[test]
    fn public_neighbours_of_private_ranges_pass() {
        assert!(is_safe_url("http://172.32.0.1/"));
        assert!(is_safe_url("http://11.0.0.1/"));
        assert!(is_safe_url("http://192.169.0.1/"));
    }

    #[cfg(feature = "fuzz")]
    mod fuzz {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn validate_never_panics(url in ".*") {
                let _ = validate_url(&url);
            }

            #[test]
            fn private_v4_always_rejected(b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
                let url = format!("http://10.{b}.{c}.{d}/");
                prop_assert!(!is_safe_url(&url));
                let url = format!("http://192.168.{c}.{d}/");
                prop_assert!(!is_safe_url(&url));
            }

            #[test]
            fn accepted_urls_are_http(url in "(https?|ftp|file)://[a-z0-9.]{1,20}(/[a-z]{0,8})?") {
                if let Ok(parsed) = validate_url(&url) {
                    prop_assert!(matches!(parsed.scheme(), "http" | "https"));
                }
            }
        }
    }
}
