//! Configuration handling for handlers that talk to third-party services.
//!
//! The dispatcher itself needs no configuration. Individual handlers read
//! their secrets and endpoints through `Config::from_env` at call time, so a
//! key rotated in the environment is picked up without rebuilding the
//! registry.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};

use url::Url;

/// Environment variable names. Public so tests and the CLI can refer to them.
pub const ENV_SCRAPING_API_KEY: &str = "SCRAPING_API_KEY";
pub const ENV_SCRAPING_API_URL: &str = "SCRAPING_API_URL";
pub const ENV_TWITTER_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
pub const ENV_TWITTER_API_URL: &str = "TWITTER_API_URL";

/// Default endpoints used when the environment does not override them.
pub const DEFAULT_SCRAPING_API_URL: &str = "https://app.scrapingbee.com/api/v1";
pub const DEFAULT_TWITTER_API_URL: &str = "https://api.twitter.com/2";

/// Handler runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    scraping_api_key: Option<String>,
    scraping_api_url: String,
    twitter_bearer_token: Option<String>,
    twitter_api_url: String,
}

impl Config {
    /// Create a new config explicitly.
    pub fn new(
        scraping_api_key: Option<String>,
        scraping_api_url: impl Into<String>,
        twitter_bearer_token: Option<String>,
        twitter_api_url: impl Into<String>,
    ) -> Self {
        Self {
            scraping_api_key,
            scraping_api_url: scraping_api_url.into(),
            twitter_bearer_token,
            twitter_api_url: twitter_api_url.into(),
        }
    }

    /// Load from environment variables, falling back to the public endpoints.
    ///
    /// Empty secrets count as absent. Endpoint overrides must be absolute
    /// http(s) URLs.
    pub fn from_env() -> Result<Self, ConfigError> {
        let scraping_api_key = non_empty_var(ENV_SCRAPING_API_KEY);
        let twitter_bearer_token = non_empty_var(ENV_TWITTER_BEARER_TOKEN);
        let scraping_api_url = endpoint_var(ENV_SCRAPING_API_URL, DEFAULT_SCRAPING_API_URL)?;
        let twitter_api_url = endpoint_var(ENV_TWITTER_API_URL, DEFAULT_TWITTER_API_URL)?;

        Ok(Self {
            scraping_api_key,
            scraping_api_url,
            twitter_bearer_token,
            twitter_api_url,
        })
    }

    /// API key for the scraping service used on paywalled hosts.
    pub fn scraping_api_key(&self) -> Option<&str> {
        self.scraping_api_key.as_deref()
    }
    /// Base URL of the scraping service.
    pub fn scraping_api_url(&self) -> &str {
        &self.scraping_api_url
    }
    /// Bearer token for the Twitter v2 API.
    pub fn twitter_bearer_token(&self) -> Option<&str> {
        self.twitter_bearer_token.as_deref()
    }
    /// Base URL of the Twitter v2 API, without a trailing slash.
    pub fn twitter_api_url(&self) -> &str {
        &self.twitter_api_url
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, DEFAULT_SCRAPING_API_URL, None, DEFAULT_TWITTER_API_URL)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn endpoint_var(key: &'static str, default: &str) -> Result<String, ConfigError> {
    let Some(value) = non_empty_var(key) else {
        return Ok(default.to_string());
    };

    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(value.trim_end_matches('/').to_string())
        }
        Ok(url) => Err(ConfigError::InvalidValue {
            field: key,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            field: key,
            reason: e.to_string(),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Ensure environment-variable manipulating tests run serially.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            ENV_SCRAPING_API_KEY,
            ENV_SCRAPING_API_URL,
            ENV_TWITTER_BEARER_TOKEN,
            ENV_TWITTER_API_URL,
        ] {
            unsafe {
                env::remove_var(key);
            }
        }
    }

    #[test]
    fn defaults_when_env_missing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.scraping_api_key(), None);
        assert_eq!(cfg.twitter_api_url(), DEFAULT_TWITTER_API_URL);
    }

    #[test]
    fn overrides_when_env_present() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_SCRAPING_API_KEY, "bee-key");
            env::set_var(ENV_SCRAPING_API_URL, "https://scraper.internal.test/api/");
            env::set_var(ENV_TWITTER_BEARER_TOKEN, "token");
        }
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.scraping_api_key(), Some("bee-key"));
        assert_eq!(cfg.scraping_api_url(), "https://scraper.internal.test/api");
        assert_eq!(cfg.twitter_bearer_token(), Some("token"));
        clear_env();
    }

    #[test]
    fn blank_secrets_are_absent() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_TWITTER_BEARER_TOKEN, "   ");
        }
        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.twitter_bearer_token(), None);
        clear_env();
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            env::set_var(ENV_TWITTER_API_URL, "ftp://api.example.com");
        }
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains(ENV_TWITTER_API_URL));
        clear_env();
    }
}
