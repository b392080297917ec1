//! Retry, deadline and normalization behaviour of `RequestExecutor`.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fintrack_application::{
    CancellationToken, ClientConfig, HttpClient, HttpClientError, RequestExecutor, RequestOptions,
    RetryConfig,
};
use fintrack_domain::{
    EncodedBody, ErrorKind, FormData, HttpMethod, HttpRequest, RequestBody, ResponseSpec,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

type Scripted = Result<ResponseSpec, HttpClientError>;

/// Replays a script of results and records every attempt.
struct ScriptedClient {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    latency: Duration,
    attempts: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl ScriptedClient {
    fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: Ok(ResponseSpec::json(200, "{}")),
            latency: Duration::ZERO,
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn always(result: Scripted) -> Self {
        Self {
            fallback: result,
            ..Self::new([])
        }
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().iter().map(|(at, _)| *at).collect()
    }

    fn last_request(&self) -> HttpRequest {
        self.attempts.lock().last().map(|(_, r)| r.clone()).unwrap()
    }
}

impl HttpClient for ScriptedClient {
    fn execute(
        &self,
        request: &HttpRequest,
    ) -> impl Future<Output = Result<ResponseSpec, HttpClientError>> + Send {
        self.attempts.lock().push((Instant::now(), request.clone()));
        let result = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            result
        }
    }
}

fn executor_for(client: &Arc<ScriptedClient>, retry: RetryConfig) -> RequestExecutor<ScriptedClient> {
    let config = ClientConfig::new("http://api.test/v1/", Duration::from_secs(1), retry);
    RequestExecutor::new(Arc::clone(client), Arc::new(config))
}

fn unavailable() -> Scripted {
    Ok(ResponseSpec::json(503, r#"{"error":"try later"}"#))
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Transaction {
    id: u32,
    amount: u64,
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_make_n_plus_one_attempts() {
    let client = Arc::new(ScriptedClient::always(unavailable()));
    let executor = executor_for(&client, RetryConfig::new(3, Duration::from_millis(100)));

    let err = executor
        .get::<Vec<Transaction>>("/transactions", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(client.attempt_count(), 4);
    assert_eq!(err.kind, ErrorKind::Server);
    assert_eq!(err.status_code, Some(503));
    assert_eq!(err.message, "try later");
}

#[tokio::test(start_paused = true)]
async fn test_backoff_doubles_between_attempts() {
    let client = Arc::new(ScriptedClient::always(unavailable()));
    let executor = executor_for(&client, RetryConfig::new(3, Duration::from_millis(100)));

    let _ = executor
        .get::<serde_json::Value>("/transactions", RequestOptions::new())
        .await;

    let times = client.attempt_times();
    let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
    let expected = [100, 200, 400].map(Duration::from_millis);
    assert_eq!(gaps.len(), expected.len());
    for (gap, expected) in gaps.iter().zip(expected) {
        assert!(
            *gap >= expected && *gap < expected + Duration::from_millis(5),
            "gap {gap:?}, expected {expected:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failures() {
    let client = Arc::new(ScriptedClient::new([
        Err(HttpClientError::ConnectionRefused {
            host: "api.test".into(),
            port: 80,
        }),
        unavailable(),
        Ok(ResponseSpec::json(
            200,
            r#"{"data":[{"id":1,"amount":2500}]}"#,
        )),
    ]));
    let executor = executor_for(&client, RetryConfig::new(3, Duration::from_millis(10)));

    let transactions: Vec<Transaction> = executor
        .get("/transactions", RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(transactions, vec![Transaction { id: 1, amount: 2500 }]);
    assert_eq!(client.attempt_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_validation_failure_is_not_retried() {
    let client = Arc::new(ScriptedClient::always(Err(HttpClientError::InvalidUrl(
        "http://api.test/v1/ bad".into(),
    ))));
    let executor = executor_for(&client, RetryConfig::new(5, Duration::from_millis(10)));

    let err = executor
        .get::<serde_json::Value>("/ bad", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(client.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unserializable_body_fails_before_any_attempt() {
    let client = Arc::new(ScriptedClient::new([]));
    let executor = executor_for(&client, RetryConfig::default());
    let mut body = BTreeMap::new();
    body.insert((1, 2), "tuple keys");

    let err = executor
        .post::<serde_json::Value, _>("/transactions", &body, RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(client.attempt_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_client_error_status_fails_fast() {
    let client = Arc::new(ScriptedClient::always(Ok(ResponseSpec::json(
        404,
        r#"{"message":"no such transaction"}"#,
    ))));
    let executor = executor_for(&client, RetryConfig::default());

    let err = executor
        .delete::<serde_json::Value>("/transactions/9", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(client.attempt_count(), 1);
    assert_eq!(err.kind, ErrorKind::Server);
    assert_eq!(err.status_code, Some(404));
    assert_eq!(err.message, "no such transaction");
    assert!(err.response_body.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_custom_retry_condition() {
    let client = Arc::new(ScriptedClient::always(Ok(ResponseSpec::new(404, ""))));
    let executor = executor_for(&client, RetryConfig::default());
    let retry = RetryConfig::new(2, Duration::from_millis(10))
        .with_condition(|err| err.status_code == Some(404));

    let err = executor
        .get::<serde_json::Value>("/flaky", RequestOptions::new().retry(retry))
        .await
        .unwrap_err();

    assert_eq!(client.attempt_count(), 3);
    assert_eq!(err.message, "request failed with status 404");
}

#[tokio::test(start_paused = true)]
async fn test_deadline_yields_timeout_without_retry() {
    let client =
        Arc::new(ScriptedClient::always(unavailable()).with_latency(Duration::from_secs(10)));
    let executor = executor_for(&client, RetryConfig::default());
    let started = Instant::now();

    let err = executor
        .get::<serde_json::Value>("/slow", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(client.attempt_count(), 1);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_per_call_timeout_override() {
    let client =
        Arc::new(ScriptedClient::always(unavailable()).with_latency(Duration::from_millis(500)));
    let executor = executor_for(&client, RetryConfig::default());

    let err = executor
        .get::<serde_json::Value>(
            "/slow",
            RequestOptions::new().timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(err.message, "request timed out after 200ms");
}

#[tokio::test(start_paused = true)]
async fn test_caller_cancellation_aborts_in_flight_attempt() {
    let client =
        Arc::new(ScriptedClient::always(unavailable()).with_latency(Duration::from_millis(800)));
    let executor = executor_for(&client, RetryConfig::default());
    let (token, receiver) = CancellationToken::new();

    let call = tokio::spawn(async move {
        executor
            .get::<serde_json::Value>("/transactions", RequestOptions::new().cancel_on(receiver))
            .await
    });
    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let err = call.await.unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(err.message, "request was cancelled");
    assert_eq!(client.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_json_body_gets_default_headers() {
    let client = Arc::new(ScriptedClient::always(Ok(ResponseSpec::json(
        201,
        r#"{"data":{"id":7,"amount":900}}"#,
    ))));
    let executor = executor_for(&client, RetryConfig::default());

    let created: Transaction = executor
        .post(
            "transactions",
            &Transaction { id: 0, amount: 900 },
            RequestOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(created, Transaction { id: 7, amount: 900 });
    let request = client.last_request();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, "http://api.test/v1/transactions");
    assert_eq!(request.headers.get("content-type"), Some("application/json"));
    assert_eq!(request.headers.get("accept"), Some("application/json"));
    let Some(EncodedBody::Text(sent)) = &request.body else {
        panic!("expected a text body");
    };
    let sent: serde_json::Value = serde_json::from_str(sent).unwrap();
    assert_eq!(sent, serde_json::json!({"id": 0, "amount": 900}));
}

#[tokio::test(start_paused = true)]
async fn test_caller_headers_win_and_forms_get_no_content_type() {
    let client = Arc::new(ScriptedClient::new([
        Ok(ResponseSpec::new(204, "")),
        Ok(ResponseSpec::new(204, "")),
    ]));
    let executor = executor_for(&client, RetryConfig::default());

    let options = RequestOptions::new()
        .header("Content-Type", "text/csv")
        .header("Accept", "text/csv");
    executor
        .put::<(), _>("/import", "id,amount", options)
        .await
        .unwrap();
    let request = client.last_request();
    assert_eq!(request.headers.get("Content-Type"), Some("text/csv"));
    assert_eq!(request.headers.get("Accept"), Some("text/csv"));

    let form = FormData::new().text("note", "receipt").file(
        "file",
        "receipt.pdf",
        Some("application/pdf".into()),
        vec![1, 2, 3],
    );
    executor
        .request::<()>(
            "/attachments",
            RequestOptions::new()
                .method(HttpMethod::Post)
                .body(RequestBody::Form(form)),
        )
        .await
        .unwrap();
    let request = client.last_request();
    assert!(!request.headers.contains("Content-Type"));
    assert!(matches!(request.body, Some(EncodedBody::Form(_))));
}

#[tokio::test(start_paused = true)]
async fn test_delete_with_body_still_sends_it() {
    let client = Arc::new(ScriptedClient::always(Ok(ResponseSpec::new(204, ""))));
    let executor = executor_for(&client, RetryConfig::default());

    executor
        .request::<()>(
            "/transactions",
            RequestOptions::new()
                .method(HttpMethod::Delete)
                .body(RequestBody::Json(serde_json::json!({"ids": [1, 2]}))),
        )
        .await
        .unwrap();

    let request = client.last_request();
    assert_eq!(request.method, HttpMethod::Delete);
    assert_eq!(request.headers.get("content-type"), Some("application/json"));
    let Some(EncodedBody::Text(sent)) = &request.body else {
        panic!("expected a text body");
    };
    let sent: serde_json::Value = serde_json::from_str(sent).unwrap();
    assert_eq!(sent, serde_json::json!({"ids": [1, 2]}));
}

#[tokio::test(start_paused = true)]
async fn test_envelope_error_is_server_error() {
    let client = Arc::new(ScriptedClient::always(Ok(ResponseSpec::json(
        200,
        r#"{"data":null,"error":"budget locked"}"#,
    ))));
    let executor = executor_for(&client, RetryConfig::default());

    let err = executor
        .patch::<serde_json::Value, _>(
            "/budgets/1",
            &serde_json::json!({"limit": 100}),
            RequestOptions::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Server);
    assert_eq!(err.message, "budget locked");
    assert_eq!(client.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_raw_envelope_returns_whole_payload() {
    let client = Arc::new(ScriptedClient::always(Ok(ResponseSpec::json(
        200,
        r#"{"data":[1,2,3],"message":"ok"}"#,
    ))));
    let executor = executor_for(&client, RetryConfig::default());

    let payload = executor
        .request_payload("/totals", RequestOptions::new().raw_envelope())
        .await
        .unwrap();

    assert_eq!(
        payload.into_value(),
        serde_json::json!({"data": [1, 2, 3], "message": "ok"})
    );
}

#[tokio::test(start_paused = true)]
async fn test_payload_shape_mismatch_is_server_error() {
    let client = Arc::new(ScriptedClient::always(Ok(ResponseSpec::json(
        200,
        r#"{"data":"not a list"}"#,
    ))));
    let executor = executor_for(&client, RetryConfig::default());

    let err = executor
        .get::<Vec<Transaction>>("/transactions", RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Server);
}
