//! HTTP Client implementation using reqwest.
//!
//! This adapter implements the `HttpClient` port using the reqwest library.
//! It performs exactly one round-trip per call; deadlines, cancellation and
//! retries belong to the `RequestExecutor`.

use std::future::Future;
use std::time::{Duration, Instant};

use fintrack_application::ports::{HttpClient, HttpClientError};
use fintrack_domain::{Headers, HttpMethod, HttpRequest, ResponseSpec};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use tracing::trace;

use crate::http::build_body;

const USER_AGENT: &str = concat!("Fintrack/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client implementation using reqwest.
///
/// Wraps `reqwest::Client` and implements the `HttpClient` port from the
/// application layer.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a new HTTP client with default settings.
    ///
    /// Default configuration:
    /// - Connect timeout: 10 seconds
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> Result<Self, HttpClientError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| HttpClientError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a new HTTP client with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn to_header_map(headers: &Headers) -> Result<HeaderMap, HttpClientError> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for header in headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|_| HttpClientError::InvalidHeader(format!("name {:?}", header.name)))?;
            let value = HeaderValue::from_str(&header.value).map_err(|_| {
                HttpClientError::InvalidHeader(format!("value for {}", header.name))
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }

    fn from_header_map(map: &HeaderMap) -> Headers {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }

    /// Maps reqwest errors to the port's `HttpClientError`.
    fn map_error(error: &reqwest::Error) -> HttpClientError {
        let host = || {
            error
                .url()
                .and_then(Url::host_str)
                .unwrap_or("unknown")
                .to_string()
        };

        if error.is_timeout() {
            return HttpClientError::Timeout {
                timeout_ms: u64::try_from(CONNECT_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
            };
        }

        if error.is_connect() {
            let message = error_chain(error);
            let lower = message.to_lowercase();
            if lower.contains("dns") || lower.contains("resolve") {
                return HttpClientError::DnsError {
                    host: host(),
                    message,
                };
            }
            if lower.contains("refused") {
                return HttpClientError::ConnectionRefused {
                    host: host(),
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            if lower.contains("certificate") || lower.contains("tls") {
                return HttpClientError::TlsError(message);
            }
            return HttpClientError::ConnectionFailed(message);
        }

        if error.is_redirect() {
            return HttpClientError::TooManyRedirects { max: MAX_REDIRECTS };
        }

        if error.is_builder() {
            return HttpClientError::InvalidUrl(error_chain(error));
        }

        if error.is_body() || error.is_decode() {
            return HttpClientError::ResponseRead(error_chain(error));
        }

        if error.is_request() {
            return HttpClientError::ConnectionFailed(error_chain(error));
        }

        HttpClientError::Other(error_chain(error))
    }
}

/// Joins an error and its sources; reqwest keeps the useful part deep down.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

impl HttpClient for ReqwestHttpClient {
    fn execute(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
        async move {
            let url = Url::parse(&request.url)
                .map_err(|e| HttpClientError::InvalidUrl(format!("{e}: {}", request.url)))?;
            let headers = Self::to_header_map(&request.headers)?;
            let body = request.body.as_ref().map(build_body).transpose()?;

            let mut builder = self
                .client
                .request(Self::to_reqwest_method(request.method), url)
                .headers(headers);
            if let Some(body) = body {
                builder = body.apply(builder);
            }

            let start = Instant::now();
            let response = builder.send().await.map_err(|e| Self::map_error(&e))?;

            let status = response.status();
            let headers = Self::from_header_map(response.headers());
            let body = response
                .text()
                .await
                .map_err(|e| HttpClientError::ResponseRead(error_chain(&e)))?;
            let duration = start.elapsed();
            trace!(status = status.as_u16(), ?duration, "response received");

            Ok(ResponseSpec {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
                body,
                duration,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_reqwest_method() {
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Get),
            Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Patch),
            Method::PATCH
        );
        assert_eq!(
            ReqwestHttpClient::to_reqwest_method(HttpMethod::Delete),
            Method::DELETE
        );
    }

    #[test]
    fn test_client_creation() {
        let client = ReqwestHttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_header_value_is_rejected() {
        let headers: Headers = [("X-Note", "line\nbreak")].into_iter().collect();
        let result = ReqwestHttpClient::to_header_map(&headers);
        assert!(matches!(result, Err(HttpClientError::InvalidHeader(_))));
    }

    #[test]
    fn test_header_round_trip() {
        let headers: Headers = [("Accept", "application/json")].into_iter().collect();
        let map = ReqwestHttpClient::to_header_map(&headers).unwrap_or_default();
        let back = ReqwestHttpClient::from_header_map(&map);
        assert_eq!(back.get("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_unparseable_url_is_invalid_url() {
        let client = ReqwestHttpClient::with_client(Client::new());
        let result = client
            .execute(&HttpRequest::new(HttpMethod::Get, "not a url"))
            .await;
        assert!(matches!(result, Err(HttpClientError::InvalidUrl(_))));
    }
}
