//! Response normalization and envelope unwrapping.

use fintrack_domain::{ClassifiedError, ResponseSpec};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::classify::{Failure, classify, envelope_message};

const ENVELOPE_KEYS: [&str; 3] = ["data", "error", "message"];

/// Normalized body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Parsed structured data (envelope already unwrapped if applicable).
    Json(Value),
    /// Non-JSON body, returned as-is.
    Text(String),
    /// Empty body (e.g. `204 No Content`).
    Empty,
}

impl Payload {
    /// Converts the payload into a JSON value; text becomes a string and an
    /// empty body becomes `null`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
            Self::Empty => Value::Null,
        }
    }

    /// Deserializes the payload into `T`.
    ///
    /// # Errors
    ///
    /// Returns a `server` error if the payload does not have the shape of `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ClassifiedError> {
        let value = self.into_value();
        serde_json::from_value(value.clone()).map_err(|e| {
            ClassifiedError::server(format!("unexpected response shape: {e}"))
                .with_body(value)
                .with_cause(e)
        })
    }
}

/// Returns true for `application/json` and any `+json` media type.
#[must_use]
pub fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .parse::<mime::Mime>()
        .is_ok_and(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
}

/// Normalizes a completed response.
///
/// # Errors
///
/// - non-2xx status: the classified `server` error
/// - JSON content type with an unparseable body: `server`
/// - an envelope carrying a non-null `error` field: `server` with that message
pub fn normalize(
    response: &ResponseSpec,
    unwrap_envelope: bool,
) -> Result<Payload, ClassifiedError> {
    if !response.is_success() {
        return Err(classify(Failure::Status(response.clone())));
    }

    if response.body.trim().is_empty() {
        return Ok(Payload::Empty);
    }

    if !response.content_type().is_some_and(is_json_content_type) {
        return Ok(Payload::Text(response.body.clone()));
    }

    let value: Value = serde_json::from_str(&response.body).map_err(|e| {
        ClassifiedError::server(format!("response body is not valid JSON: {e}"))
            .with_status(response.status)
            .with_body(Value::String(response.body.clone()))
            .with_cause(e)
    })?;

    if unwrap_envelope {
        unwrap(value, response.status).map(Payload::Json)
    } else {
        Ok(Payload::Json(value))
    }
}

fn is_envelope(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| ENVELOPE_KEYS.iter().any(|key| object.contains_key(*key)))
}

fn unwrap(value: Value, status: u16) -> Result<Value, ClassifiedError> {
    if !is_envelope(&value) {
        return Ok(value);
    }

    if value.get("error").is_some_and(|e| !e.is_null()) {
        let message = envelope_message(&value).unwrap_or_else(|| {
            value
                .get("error")
                .map_or_else(String::new, ToString::to_string)
        });
        return Err(ClassifiedError::server(message)
            .with_status(status)
            .with_body(value));
    }

    match value {
        Value::Object(mut object) if object.contains_key("data") => {
            Ok(object.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fintrack_domain::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_data_envelope_is_unwrapped() {
        let response = ResponseSpec::json(200, r#"{"data":{"id":1}}"#);
        assert_eq!(
            normalize(&response, true).unwrap(),
            Payload::Json(json!({"id": 1}))
        );
    }

    #[test]
    fn test_error_envelope_becomes_server_error() {
        let response = ResponseSpec::json(200, r#"{"error":"msg"}"#);
        let err = normalize(&response, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.message, "msg");
        assert_eq!(err.status_code, Some(200));
    }

    #[test]
    fn test_bare_array_is_unchanged() {
        let response = ResponseSpec::json(200, "[1,2,3]");
        assert_eq!(
            normalize(&response, true).unwrap(),
            Payload::Json(json!([1, 2, 3]))
        );
    }

    #[test]
    fn test_message_only_envelope_returns_whole_payload() {
        let response = ResponseSpec::json(200, r#"{"message":"created","id":9}"#);
        assert_eq!(
            normalize(&response, true).unwrap(),
            Payload::Json(json!({"message": "created", "id": 9}))
        );
    }

    #[test]
    fn test_null_error_is_ignored() {
        let response = ResponseSpec::json(200, r#"{"data":[1],"error":null}"#);
        assert_eq!(normalize(&response, true).unwrap(), Payload::Json(json!([1])));
    }

    #[test]
    fn test_envelope_opt_out() {
        let response = ResponseSpec::json(200, r#"{"error":"kept"}"#);
        assert_eq!(
            normalize(&response, false).unwrap(),
            Payload::Json(json!({"error": "kept"}))
        );
    }

    #[test]
    fn test_invalid_json_is_server_error() {
        let response = ResponseSpec::json(200, "{not json");
        let err = normalize(&response, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Server);
        assert!(err.cause.is_some());
    }

    #[test]
    fn test_non_json_content_type_returns_text() {
        let response = ResponseSpec::new(200, "plain words").with_header("content-type", "text/plain");
        assert_eq!(
            normalize(&response, true).unwrap(),
            Payload::Text("plain words".into())
        );
    }

    #[test]
    fn test_empty_body() {
        let response = ResponseSpec::json(204, "");
        assert_eq!(normalize(&response, true).unwrap(), Payload::Empty);
        assert!(Payload::Empty.deserialize::<()>().is_ok());
        assert_eq!(
            Payload::Empty.deserialize::<Option<u32>>().unwrap(),
            None
        );
    }

    #[test]
    fn test_non_success_is_rejected_before_parsing() {
        let response = ResponseSpec::json(502, r#"{"data":"ignored"}"#);
        let err = normalize(&response, true).unwrap_err();
        assert_eq!(err.status_code, Some(502));
    }

    #[test]
    fn test_content_type_detection() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html"));
        assert!(!is_json_content_type("not a mime"));
    }

    #[test]
    fn test_deserialize_shape_mismatch_is_server_error() {
        let err = Payload::Json(json!({"a": 1}))
            .deserialize::<Vec<u32>>()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Server);
    }
}
