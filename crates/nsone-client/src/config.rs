//! client config
//!
//! Shared by the HTTP transport, the retrying client and the typed API.

use std::time::Duration;

/// Root of the provider's REST API.
pub const DEFAULT_API_URL: &str = "https://api.nsone.net/v1";

/// Class of a failure that is retried in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum TransientKind {
    #[display("timeout")]
    Timeout,
    #[display("rate limit exceeded")]
    RateLimited,
}

/// Linear backoff for transient failures.
///
/// After the `n`-th failed attempt the client sleeps `n * base`, where `base`
/// depends on the failure class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// total attempts of one logical call, including the first
    pub max_attempts: u32,
    /// backoff base after a transport timeout
    pub timeout_backoff: Duration,
    /// backoff base after HTTP 429
    pub rate_limit_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            timeout_backoff: Duration::from_millis(50),
            rate_limit_backoff: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following the failed `attempt` (1-based).
    pub fn backoff(&self, attempt: u32, kind: TransientKind) -> Duration {
        let base = match kind {
            TransientKind::Timeout => self.timeout_backoff,
            TransientKind::RateLimited => self.rate_limit_backoff,
        };
        base.saturating_mul(attempt)
    }

    /// Attempt cap, never below one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// NSONE client config.
#[derive(Clone)]
pub struct ClientConfig {
    /// api base url
    pub api_url: String,
    /// value of the `X-NSONE-Key` header
    pub api_key: String,
    /// per-call connect and read timeout
    pub request_timeout: Duration,
    /// ceiling of concurrent in-flight calls
    pub max_connections: usize,
    pub retry: RetryPolicy,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("max_connections", &self.max_connections)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ClientConfig {
    /// create new client config with default parameters.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(5),
            max_connections: 50,
            retry: RetryPolicy::default(),
        }
    }

    /// set api base url.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// set connection ceiling.
    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// set retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
