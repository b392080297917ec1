//! Request executor: one logical call, many attempts.

use std::sync::Arc;
use std::time::Duration;

use fintrack_domain::{
    ClassifiedError, EncodedBody, HttpMethod, HttpRequest, RequestBody, ResponseSpec,
    request::names,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, debug_span, warn};
use uuid::Uuid;

use super::classify::{CancelReason, Failure, classify};
use super::normalize::{Payload, normalize};
use super::options::RequestOptions;
use crate::config::ClientConfig;
use crate::ports::{CancellationReceiver, HttpClient};

const JSON_MEDIA_TYPE: &str = "application/json";

/// Executes requests with deadline, cancellation, retry and normalization.
///
/// Stateless across calls: concurrent requests share only the read-only
/// [`ClientConfig`].
///
/// # Example
///
/// ```ignore
/// let executor = RequestExecutor::new(Arc::new(ReqwestHttpClient::new()?), Arc::new(ClientConfig::from_env()));
/// let transactions: Vec<Transaction> = executor.get("/transactions", RequestOptions::new()).await?;
/// ```
pub struct RequestExecutor<C: HttpClient> {
    client: Arc<C>,
    config: Arc<ClientConfig>,
}

impl<C: HttpClient> RequestExecutor<C> {
    /// Creates an executor over the given transport and configuration.
    pub const fn new(client: Arc<C>, config: Arc<ClientConfig>) -> Self {
        Self { client, config }
    }

    /// Returns the shared configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Executes a request and deserializes the normalized payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns the classified error of the last attempt, or a `server` error
    /// if the payload does not match `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ClassifiedError> {
        self.request_payload(endpoint, options).await?.deserialize()
    }

    /// Executes a request and returns the normalized payload.
    ///
    /// # Errors
    ///
    /// - `validation` if the request cannot be built (no attempt is made)
    /// - the classified error of the first non-retryable failure, or of the
    ///   last attempt once retries are exhausted
    /// - `server` if a successful response cannot be normalized
    pub async fn request_payload(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Payload, ClassifiedError> {
        let request = self.build_request(endpoint, &options)?;
        let span = debug_span!(
            "request",
            id = %Uuid::now_v7(),
            method = %request.method,
            url = %request.url,
        );
        self.run(request, options).instrument(span).await
    }

    /// `GET` convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ClassifiedError> {
        self.request(endpoint, options.method(HttpMethod::Get)).await
    }

    /// `POST` convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request); an unserializable body is a
    /// `validation` error.
    pub async fn post<T, B>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ClassifiedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Post, endpoint, body, options)
            .await
    }

    /// `PUT` convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub async fn put<T, B>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ClassifiedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Put, endpoint, body, options)
            .await
    }

    /// `PATCH` convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`post`](Self::post).
    pub async fn patch<T, B>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ClassifiedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_with_body(HttpMethod::Patch, endpoint, body, options)
            .await
    }

    /// `DELETE` convenience wrapper.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ClassifiedError> {
        self.request(endpoint, options.method(HttpMethod::Delete))
            .await
    }

    async fn send_with_body<T, B>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T, ClassifiedError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = RequestBody::json(body)?;
        self.request(endpoint, options.method(method).body(body))
            .await
    }

    /// Builds headers and encodes the body. Failures here are never retried.
    fn build_request(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<HttpRequest, ClassifiedError> {
        let mut request = HttpRequest::new(options.method, self.config.url_for(endpoint));
        request.headers = options.headers.clone();

        if let Some(body) = &options.body {
            if !options.method.has_body() {
                debug!(method = %options.method, "sending a body with a bodiless method");
            }
            if !body.is_form() {
                request
                    .headers
                    .set_if_absent(names::CONTENT_TYPE, JSON_MEDIA_TYPE);
            }
            request.body = Some(EncodedBody::try_from(body.clone())?);
        }
        request.headers.set_if_absent(names::ACCEPT, JSON_MEDIA_TYPE);

        Ok(request)
    }

    async fn run(
        &self,
        request: HttpRequest,
        options: RequestOptions,
    ) -> Result<Payload, ClassifiedError> {
        let retry = options.retry.as_ref().unwrap_or_else(|| self.config.retry());
        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let mut last_error = None;

        for attempt in 0..=retry.max_retries {
            debug!(attempt, "sending request");
            match self
                .attempt(&request, timeout, options.cancel.as_ref())
                .await
            {
                Ok(response) => {
                    debug!(attempt, status = response.status, "request succeeded");
                    return normalize(&response, options.unwrap_envelope);
                }
                Err(failure) => {
                    let error = classify(failure);
                    if !retry.should_retry(attempt, &error) {
                        debug!(attempt, kind = %error.kind, "giving up: {}", error.message);
                        return Err(error);
                    }
                    let delay = retry.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        kind = %error.kind,
                        status = ?error.status_code,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "request failed, retrying: {}",
                        error.message
                    );
                    last_error = Some(error);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClassifiedError::unknown("no attempt was made")))
    }

    /// One network call raced against its deadline and the caller's token.
    async fn attempt(
        &self,
        request: &HttpRequest,
        timeout: Duration,
        cancel: Option<&CancellationReceiver>,
    ) -> Result<ResponseSpec, Failure> {
        let mut cancel = cancel.cloned();
        let cancelled = async {
            match cancel.as_mut() {
                Some(receiver) => receiver.cancelled().await,
                None => std::future::pending().await,
            }
        };

        let response = tokio::select! {
            biased;
            () = cancelled => return Err(Failure::Cancelled(CancelReason::Caller)),
            () = tokio::time::sleep(timeout) => {
                return Err(Failure::Cancelled(CancelReason::Deadline(timeout)));
            }
            result = self.client.execute(request) => result?,
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(Failure::Status(response))
        }
    }
}

impl<C: HttpClient> Clone for RequestExecutor<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: Arc::clone(&self.config),
        }
    }
}
