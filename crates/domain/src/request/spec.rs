//! Fully built request handed to the transport

use super::{EncodedBody, Headers, HttpMethod};

/// A request ready to be executed by an `HttpClient`.
///
/// Built once per logical call and reused unchanged for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: String,
    /// Final header set.
    pub headers: Headers,
    /// Encoded body, if any.
    pub body: Option<EncodedBody>,
}

impl HttpRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }
}
