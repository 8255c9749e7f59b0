//! Client configuration loading and resolution.

use std::time::Duration;

use crate::types::{InsightsError, InsightsResult};

/// Public PokeAPI endpoint.
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 500;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings for a [`crate::PokeClient`] and its HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Total GET attempts per URL, including the first.
    pub max_attempts: u32,
    /// Linear backoff unit: attempt `k` waits `base_delay * k`.
    pub base_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Detail fetches kept in flight at once. 1 means strictly sequential.
    pub concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: 1,
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with any `POKEAPI_*` environment variables.
    ///
    /// Unparsable numeric values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(base_url) = lookup("POKEAPI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(n) = parse_var(&lookup, "POKEAPI_MAX_ATTEMPTS") {
            config.max_attempts = n;
        }
        if let Some(ms) = parse_var(&lookup, "POKEAPI_BACKOFF_MS") {
            config.base_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var(&lookup, "POKEAPI_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var(&lookup, "POKEAPI_CONCURRENCY") {
            config.concurrency = n;
        }

        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Reject settings the client cannot run with.
    pub fn validate(&self) -> InsightsResult<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| InsightsError::Config(format!("base URL '{}': {e}", self.base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(InsightsError::Config(format!(
                "base URL must be http(s), got scheme '{}'",
                parsed.scheme()
            )));
        }
        if self.max_attempts == 0 {
            return Err(InsightsError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(InsightsError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring {key}={raw:?}: not a valid number");
            None
        }
    }
}
