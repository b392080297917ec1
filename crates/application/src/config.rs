//! Environment-backed client configuration.
//!
//! Built once at start-up and shared read-only by every request. Each value
//! falls back to its default when the variable is absent, blank or
//! unparseable; a warning is logged for the latter two.

use std::env;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::client::RetryConfig;

/// Variable holding the API base URL.
pub const ENV_API_URL: &str = "FINTRACK_API_URL";
/// Variable holding the per-attempt timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "FINTRACK_API_TIMEOUT_MS";
/// Variable holding the retry budget.
pub const ENV_MAX_RETRIES: &str = "FINTRACK_API_MAX_RETRIES";
/// Variable holding the base backoff delay in milliseconds.
pub const ENV_RETRY_DELAY_MS: &str = "FINTRACK_API_RETRY_DELAY_MS";

const DEFAULT_API_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Process-wide settings for the request executor.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
    retry: RetryConfig,
}

impl ClientConfig {
    /// Creates a config from explicit values.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration, retry: RetryConfig) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            retry,
        }
    }

    /// Reads the configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    #[must_use]
    pub fn from_lookup<F>(mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let base_url = match non_blank(ENV_API_URL, &mut lookup) {
            Some(value) if Url::parse(&value).is_ok() => value,
            Some(value) => {
                warn!(variable = ENV_API_URL, %value, "ignoring unparseable base URL");
                DEFAULT_API_URL.to_string()
            }
            None => DEFAULT_API_URL.to_string(),
        };
        let timeout_ms = parse_or(ENV_TIMEOUT_MS, DEFAULT_TIMEOUT_MS, &mut lookup);
        let max_retries = parse_or(ENV_MAX_RETRIES, DEFAULT_MAX_RETRIES, &mut lookup);
        let retry_delay_ms = parse_or(ENV_RETRY_DELAY_MS, DEFAULT_RETRY_DELAY_MS, &mut lookup);

        Self::new(
            base_url,
            Duration::from_millis(timeout_ms),
            RetryConfig::new(max_retries, Duration::from_millis(retry_delay_ms)),
        )
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default per-attempt deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Default retry settings.
    #[must_use]
    pub const fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Joins `endpoint` onto the base URL.
    #[must_use]
    pub fn url_for(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        if endpoint.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{endpoint}", self.base_url)
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_API_URL,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
            RetryConfig::new(
                DEFAULT_MAX_RETRIES,
                Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            ),
        )
    }
}

fn non_blank<F>(key: &str, lookup: &mut F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<T, F>(key: &str, default: T, lookup: &mut F) -> T
where
    T: std::str::FromStr + Copy,
    F: FnMut(&str) -> Option<String>,
{
    match non_blank(key, lookup) {
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(variable = key, %value, "ignoring non-numeric value");
            default
        }),
        None => default,
    }
}
