//! Client configuration.
//!
//! Defaults target the mock backend on `127.0.0.1:3000`. `from_env` lets the
//! environment override each field; unparsable values fall back to the
//! default.

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix for every endpoint key.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Default deadline for every call; `RequestOptions::timeout` overrides it.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            timeout: None,
            user_agent: format!("request-core/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Read `REQUEST_BASE_URL`, `REQUEST_CONNECT_TIMEOUT_SECS` and
    /// `REQUEST_TIMEOUT_SECS` over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let secs = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());
        Self {
            base_url: lookup("REQUEST_BASE_URL").unwrap_or(defaults.base_url),
            connect_timeout: secs("REQUEST_CONNECT_TIMEOUT_SECS")
                .map(|s| Duration::from_secs(s.max(1)))
                .unwrap_or(defaults.connect_timeout),
            timeout: secs("REQUEST_TIMEOUT_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .or(defaults.timeout),
            user_agent: defaults.user_agent,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The base URL without a trailing slash, after checking it parses.
    pub fn normalized_base_url(&self) -> Result<String, ConfigError> {
        url::Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })?;
        Ok(self.base_url.trim_end_matches('/').to_string())
    }
}
