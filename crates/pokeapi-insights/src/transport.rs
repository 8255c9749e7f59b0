//! HTTP transport wrapping reqwest.
//!
//! One idempotent GET per call, decoded as JSON. Any failure (network error,
//! non-2xx status, undecodable body) is retried with linear backoff until the
//! attempt budget runs out; the last failure is then returned as a
//! [`TransportError`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::types::{FetchFailure, InsightsError, InsightsResult, TransportError};

/// Longest response body kept in a [`FetchFailure::Status`].
const MAX_ERROR_BODY: usize = 256;

/// Anything that can turn a fully-qualified URL into a JSON document.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, TransportError>;
}

/// Resolve a listing or resource path against the API base URL.
///
/// Absolute `http://` / `https://` URLs (e.g. `next` cursors and chain links)
/// pass through untouched.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_matches('/')
    )
}

/// Bounded retry with linear backoff and no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait before `attempt` (1-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            Duration::ZERO
        } else {
            self.base_delay * attempt
        }
    }

    /// Run `attempt_fn` until it succeeds or the budget is spent.
    ///
    /// `attempt_fn` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, url: &str, mut attempt_fn: F) -> Result<T, TransportError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchFailure>>,
    {
        let mut attempt = 1;
        loop {
            match attempt_fn(attempt).await {
                Ok(value) => return Ok(value),
                Err(source) if attempt >= self.max_attempts => {
                    return Err(TransportError {
                        url: url.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
                Err(source) => {
                    attempt += 1;
                    let delay = self.delay_before(attempt);
                    tracing::warn!(
                        "GET {url} failed ({source}); attempt {attempt}/{} in {delay:?}",
                        self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay)
    }
}

/// Transport backed by one pooled `reqwest::Client`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpTransport {
    /// Build a transport from client settings.
    ///
    /// Proxy settings from the environment are ignored so requests behave
    /// the same on every host.
    pub fn new(config: &ClientConfig) -> InsightsResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .no_proxy()
            .user_agent(concat!("pokeapi-insights/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InsightsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            policy: RetryPolicy::from(config),
        })
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn get_once(&self, url: &str) -> Result<Value, FetchFailure> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Value, TransportError> {
        tracing::debug!("GET {url}");
        self.policy.run(url, |_| self.get_once(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn failure() -> FetchFailure {
        FetchFailure::Status {
            status: 503,
            body: String::new(),
        }
    }

    #[test]
    fn test_resolve_relative_path() {
        assert_eq!(
            resolve_url("https://pokeapi.co/api/v2", "pokemon/pikachu"),
            "https://pokeapi.co/api/v2/pokemon/pikachu"
        );
        assert_eq!(
            resolve_url("https://pokeapi.co/api/v2/", "/type/fire/"),
            "https://pokeapi.co/api/v2/type/fire"
        );
    }

    #[test]
    fn test_resolve_absolute_url_verbatim() {
        let next = "https://pokeapi.co/api/v2/pokemon?offset=20&limit=20";
        assert_eq!(resolve_url("http://localhost:1234", next), next);
    }

    #[test]
    fn test_linear_delay_schedule() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_before(3), Duration::from_millis(1500));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result = policy
            .run("stub://flaky", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(failure())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1.0s before attempt 2, 1.5s before attempt 3.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(2500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2600), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_budget() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run("stub://down", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(failure()) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.url, "stub://down");
        assert!(matches!(err.source, FetchFailure::Status { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_sleep() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        let started = Instant::now();
        let result = policy.run("stub://ok", |_| async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert!(started.elapsed() < Duration::from_millis(1));
    }

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new(&ClientConfig::default()).unwrap();
        assert_eq!(transport.policy().max_attempts, 3);
    }
}
