//! HTTP Client port

use std::future::Future;

use fintrack_domain::{ErrorKind, HttpRequest, ResponseSpec};
use thiserror::Error;
use tokio::sync::watch;

/// Raw transport failures reported by an `HttpClient` adapter.
///
/// These never leave the application layer: the executor classifies each one
/// into a `ClassifiedError` before deciding on a retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpClientError {
    /// The target URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A header name or value is not valid on the wire.
    #[error("invalid header {0}")]
    InvalidHeader(String),

    /// The body could not be turned into a transport payload.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// DNS resolution failed.
    #[error("could not resolve host {host}: {message}")]
    DnsError {
        /// Host that failed to resolve.
        host: String,
        /// Underlying message.
        message: String,
    },

    /// The peer refused the connection.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Any other connection-level failure.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS negotiation failed.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// The redirect limit was exceeded.
    #[error("too many redirects (max {max})")]
    TooManyRedirects {
        /// Configured redirect limit.
        max: usize,
    },

    /// The response body could not be read to completion.
    #[error("failed to read response body: {0}")]
    ResponseRead(String),

    /// The transport enforced its own deadline.
    #[error("transport timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The transport observed a cancellation.
    #[error("request cancelled")]
    Cancelled,

    /// Anything the adapter could not map.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Maps the transport failure onto the classified taxonomy.
    #[must_use]
    pub const fn to_error_kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl(_) | Self::InvalidHeader(_) | Self::InvalidBody(_) => {
                ErrorKind::Validation
            }
            Self::DnsError { .. }
            | Self::ConnectionRefused { .. }
            | Self::ConnectionFailed(_)
            | Self::TlsError(_)
            | Self::TooManyRedirects { .. }
            | Self::ResponseRead(_) => ErrorKind::Network,
            Self::Timeout { .. } | Self::Cancelled => ErrorKind::Timeout,
            Self::Other(_) => ErrorKind::Unknown,
        }
    }
}

/// Port for executing a single HTTP round-trip.
///
/// Implementations perform exactly one network call per invocation; retries,
/// deadlines and cancellation are handled by the caller.
pub trait HttpClient: Send + Sync {
    /// Executes the request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error if the call could not complete.
    fn execute(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send;
}

/// Caller side of a cancellation pair.
///
/// Dropping the token without calling [`cancel`](Self::cancel) never
/// cancels anything.
#[derive(Debug)]
pub struct CancellationToken {
    sender: watch::Sender<bool>,
}

impl CancellationToken {
    /// Creates a new token and the receiver to hand to a request.
    #[must_use]
    pub fn new() -> (Self, CancellationReceiver) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, CancellationReceiver { receiver })
    }

    /// Signals cancellation to every receiver.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Request side of a cancellation pair. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
}

impl CancellationReceiver {
    /// Returns true if cancellation has been signalled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is signalled; pends forever if the token
    /// is dropped first.
    pub async fn cancelled(&mut self) {
        if self.receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
