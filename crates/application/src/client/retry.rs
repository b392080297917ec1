//! Retry policy: whether to retry a classified error and how long to wait.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fintrack_domain::{ClassifiedError, ErrorKind};

/// Status codes treated as transient by the default retry condition.
pub const TRANSIENT_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Predicate deciding whether a classified error may be retried.
pub type RetryCondition = Arc<dyn Fn(&ClassifiedError) -> bool + Send + Sync>;

/// Default retry condition.
///
/// `network` errors are retried, and so are `server` errors whose status is
/// in [`TRANSIENT_STATUSES`]. Everything else fails fast: a `timeout` means
/// the caller's deadline or token fired and the result is no longer wanted.
#[must_use]
pub fn is_transient(error: &ClassifiedError) -> bool {
    match error.kind {
        ErrorKind::Network => true,
        ErrorKind::Server => error
            .status_code
            .is_some_and(|status| TRANSIENT_STATUSES.contains(&status)),
        ErrorKind::Timeout | ErrorKind::Validation | ErrorKind::Unknown => false,
    }
}

/// Retry settings for one logical request.
#[derive(Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; `N` allows `N + 1` attempts.
    pub max_retries: u32,
    /// Base backoff delay, doubled after every failed attempt.
    pub retry_delay: Duration,
    /// Decides whether a given failure is retried.
    pub retry_condition: RetryCondition,
}

impl RetryConfig {
    /// Creates a config with the default retry condition.
    #[must_use]
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
            retry_condition: Arc::new(is_transient),
        }
    }

    /// A config that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Replaces the retry condition.
    #[must_use]
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ClassifiedError) -> bool + Send + Sync + 'static,
    {
        self.retry_condition = Arc::new(condition);
        self
    }

    /// Returns true if attempt `attempt` (zero-based) failed with `error`
    /// and another attempt should follow.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &ClassifiedError) -> bool {
        attempt < self.max_retries && (self.retry_condition)(error)
    }

    /// Backoff to wait after zero-based attempt `attempt` failed:
    /// `retry_delay × 2^attempt`, saturating instead of overflowing.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let mut delay = self.retry_delay;
        for _ in 0..attempt {
            if delay.is_zero() || delay == Duration::MAX {
                break;
            }
            delay = delay.saturating_mul(2);
        }
        delay
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1_000))
    }
}

impl fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}
