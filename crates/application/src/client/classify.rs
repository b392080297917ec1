//! Error classification
//!
//! Every failed attempt is funnelled through [`classify`], which is the only
//! place raw transport failures are inspected.

use std::time::Duration;

use fintrack_domain::{ClassifiedError, ResponseSpec};
use serde_json::Value;

use crate::ports::HttpClientError;

/// Why an in-flight call was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The per-attempt deadline elapsed.
    Deadline(Duration),
    /// The caller's cancellation token fired.
    Caller,
}

/// An unclassified attempt failure.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Already classified; passed through unchanged.
    Classified(ClassifiedError),
    /// The call completed with a non-2xx status.
    Status(ResponseSpec),
    /// The call was aborted by the deadline or the caller.
    Cancelled(CancelReason),
    /// The transport could not complete the call.
    Transport(HttpClientError),
}

impl From<HttpClientError> for Failure {
    fn from(error: HttpClientError) -> Self {
        Self::Transport(error)
    }
}

impl From<ClassifiedError> for Failure {
    fn from(error: ClassifiedError) -> Self {
        Self::Classified(error)
    }
}

/// Maps a failure into the classified taxonomy.
#[must_use]
pub fn classify(failure: Failure) -> ClassifiedError {
    match failure {
        Failure::Classified(error) => error,
        Failure::Status(response) => classify_status(&response),
        Failure::Cancelled(CancelReason::Deadline(timeout)) => ClassifiedError::timeout(format!(
            "request timed out after {}ms",
            timeout.as_millis()
        )),
        Failure::Cancelled(CancelReason::Caller) => {
            ClassifiedError::timeout("request was cancelled")
        }
        Failure::Transport(error) => {
            ClassifiedError::new(error.to_error_kind(), error.to_string()).with_cause(error)
        }
    }
}

/// Builds a `server` error from a non-2xx response.
///
/// The body is parsed best-effort: JSON when possible, otherwise kept as raw
/// text. A message found in an `error`/`message` field is preferred.
fn classify_status(response: &ResponseSpec) -> ClassifiedError {
    let body = parse_body_lossy(&response.body);
    let message = body
        .as_ref()
        .and_then(envelope_message)
        .unwrap_or_else(|| status_message(response));

    let error = ClassifiedError::server(message).with_status(response.status);
    match body {
        Some(body) => error.with_body(body),
        None => error,
    }
}

fn status_message(response: &ResponseSpec) -> String {
    if response.status_text.is_empty() {
        format!("request failed with status {}", response.status)
    } else {
        format!(
            "request failed with status {} {}",
            response.status, response.status_text
        )
    }
}

fn parse_body_lossy(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

/// Extracts a human-readable message from an error payload.
pub(crate) fn envelope_message(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    for key in ["error", "message"] {
        match object.get(key) {
            Some(Value::String(text)) if !text.is_empty() => return Some(text.clone()),
            Some(Value::Object(inner)) => {
                if let Some(Value::String(text)) = inner.get("message") {
                    return Some(text.clone());
                }
            }
            _ => {}
        }
    }
    None
}
