//! Per-call request options.

use std::time::Duration;

use fintrack_domain::{Headers, HttpMethod, RequestBody};

use super::retry::RetryConfig;
use crate::ports::CancellationReceiver;

/// Options for a single logical request.
///
/// Unset fields fall back to the executor's [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: HttpMethod,
    /// Caller-supplied headers.
    pub headers: Headers,
    /// Optional body.
    pub body: Option<RequestBody>,
    /// Per-attempt deadline override.
    pub timeout: Option<Duration>,
    /// Retry override.
    pub retry: Option<RetryConfig>,
    /// External cancellation.
    pub cancel: Option<CancellationReceiver>,
    /// Whether `{data, error, message}` envelopes are unwrapped.
    pub unwrap_envelope: bool,
}

impl RequestOptions {
    /// Creates default options: `GET`, no body, envelope unwrapping on.
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: HttpMethod::Get,
            headers: Headers::new(),
            body: None,
            timeout: None,
            retry: None,
            cancel: None,
            unwrap_envelope: true,
        }
    }

    /// Sets the method.
    #[must_use]
    pub const fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Overrides the per-attempt deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the retry settings.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Aborts the call when `cancel` fires.
    #[must_use]
    pub fn cancel_on(mut self, cancel: CancellationReceiver) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Returns envelopes untouched.
    #[must_use]
    pub const fn raw_envelope(mut self) -> Self {
        self.unwrap_envelope = false;
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new()
    }
}
