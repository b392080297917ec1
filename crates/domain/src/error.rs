//! Domain error types
//!
//! [`ClassifiedError`] is the only error shape the request executor ever
//! returns. Every failure (transport, deadline, status, body) is mapped into
//! one of the closed [`ErrorKind`] categories exactly once per attempt.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed taxonomy of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The transport could not complete the call.
    Network,

    /// The deadline elapsed or the caller cancelled the call.
    Timeout,

    /// Non-2xx status, or a success response with a malformed body.
    Server,

    /// The request could not even be constructed.
    Validation,

    /// Anything unrecognized.
    Unknown,
}

impl ErrorKind {
    /// Returns a human-readable title for this error kind.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Network => "Network Error",
            Self::Timeout => "Request Timeout",
            Self::Server => "Server Error",
            Self::Validation => "Invalid Request",
            Self::Unknown => "Unknown Error",
        }
    }

    /// Returns the stable snake-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Server => "server",
            Self::Validation => "validation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, clonable causal error.
pub type ErrorCause = Arc<dyn StdError + Send + Sync>;

/// A failure normalized into the [`ErrorKind`] taxonomy.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    /// Failure category used for retry and propagation decisions.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// HTTP status code, when the failure came from a response.
    pub status_code: Option<u16>,
    /// Response body, parsed as JSON when possible, raw text otherwise.
    pub response_body: Option<serde_json::Value>,
    /// Underlying error, kept for chained diagnostics.
    #[source]
    pub cause: Option<ErrorCause>,
}

impl ClassifiedError {
    /// Creates an error of the given kind with no extra context.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            response_body: None,
            cause: None,
        }
    }

    /// Creates a `network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// Creates a `timeout` error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Creates a `server` error.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    /// Creates a `validation` error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates an `unknown` error.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Attaches a status code.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Attaches a response body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.response_body = Some(body);
        self
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Returns true if this error has the given kind.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A filter period name is not recognized.
    #[error("unknown period: {0}")]
    UnknownPeriod(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = ClassifiedError::server("boom").with_status(503);
        assert_eq!(err.to_string(), "server: boom");
        assert_eq!(err.status_code, Some(503));
    }

    #[test]
    fn test_cause_is_exposed_as_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = ClassifiedError::network("connection lost").with_cause(io);
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("reset by peer"));
    }

    #[test]
    fn test_clone_shares_cause() {
        let io = std::io::Error::other("inner");
        let err = ClassifiedError::unknown("outer").with_cause(io);
        let copy = err.clone();
        assert!(copy.cause.is_some());
        assert_eq!(copy.kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Validation).unwrap_or_default();
        assert_eq!(json, "\"validation\"");
        assert_eq!(ErrorKind::Timeout.title(), "Request Timeout");
    }
}
