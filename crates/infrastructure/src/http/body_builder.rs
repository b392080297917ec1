//! HTTP request body builder.
//!
//! Turns the domain `EncodedBody` into something reqwest can send.

use fintrack_application::HttpClientError;
use fintrack_domain::{EncodedBody, FormData, FormField};
use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};

/// Error type for body building operations.
#[derive(Debug, thiserror::Error)]
pub enum BodyBuildError {
    /// A file part declared an unusable MIME type.
    #[error("invalid MIME type for form field {field}: {message}")]
    InvalidMime {
        /// Name of the offending field.
        field: String,
        /// Parser message.
        message: String,
    },
}

impl From<BodyBuildError> for HttpClientError {
    fn from(error: BodyBuildError) -> Self {
        Self::InvalidBody(error.to_string())
    }
}

/// Result of building a body.
#[derive(Debug)]
pub enum BuiltBody {
    /// Text body, sent verbatim.
    Text(String),
    /// Multipart form data.
    Multipart(Form),
}

impl BuiltBody {
    /// Check if this is a multipart form.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }

    /// Attaches the body to a request builder.
    ///
    /// Multipart bodies set their own `Content-Type` with the boundary.
    #[must_use]
    pub fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Text(content) => builder.body(content),
            Self::Multipart(form) => builder.multipart(form),
        }
    }
}

/// Build a transport body from an encoded request body.
///
/// # Errors
///
/// Returns an error if a multipart file part has an invalid MIME type.
pub fn build_body(body: &EncodedBody) -> Result<BuiltBody, BodyBuildError> {
    match body {
        EncodedBody::Text(content) => Ok(BuiltBody::Text(content.clone())),
        EncodedBody::Form(form) => build_multipart_form(form).map(BuiltBody::Multipart),
    }
}

fn build_multipart_form(data: &FormData) -> Result<Form, BodyBuildError> {
    let mut form = Form::new();

    for field in data.fields() {
        match field {
            FormField::Text { name, value } => {
                form = form.text(name.clone(), value.clone());
            }
            FormField::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let mut part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(mime) = content_type {
                    part = part
                        .mime_str(mime)
                        .map_err(|e| BodyBuildError::InvalidMime {
                            field: name.clone(),
                            message: e.to_string(),
                        })?;
                }
                form = form.part(name.clone(), part);
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_body() {
        let built = build_body(&EncodedBody::Text("{}".into()));
        assert!(matches!(built, Ok(BuiltBody::Text(ref s)) if s == "{}"));
    }

    #[test]
    fn test_multipart_body() {
        let form = FormData::new().text("note", "groceries").file(
            "receipt",
            "receipt.png",
            Some("image/png".into()),
            vec![0x89, 0x50],
        );
        let built = build_body(&EncodedBody::Form(form));
        assert!(built.is_ok_and(|b| b.is_multipart()));
    }

    #[test]
    fn test_invalid_mime_is_rejected() {
        let form = FormData::new().file("receipt", "r.bin", Some("not a mime".into()), vec![]);
        let err = build_body(&EncodedBody::Form(form)).err();
        assert!(matches!(
            err,
            Some(BodyBuildError::InvalidMime { ref field, .. }) if field == "receipt"
        ));

        let transport: Option<HttpClientError> = err.map(Into::into);
        assert!(matches!(transport, Some(HttpClientError::InvalidBody(_))));
    }
}
