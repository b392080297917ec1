//! HTTP request body types

use serde::Serialize;

use crate::error::ClassifiedError;

/// A field of a multipart form payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// In-memory file part.
    File {
        /// Field name.
        name: String,
        /// File name reported to the server.
        file_name: String,
        /// Optional MIME type of the part.
        content_type: Option<String>,
        /// File contents.
        bytes: Vec<u8>,
    },
}

/// Multipart form payload.
///
/// The transport chooses the multipart boundary, so a form body never gets
/// an explicit `Content-Type` from the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<FormField>,
}

impl FormData {
    /// Creates an empty form.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a file part.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.fields.push(FormField::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type,
            bytes,
        });
        self
    }

    /// Returns the fields in insertion order.
    #[must_use]
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }
}

/// Request body as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Raw text, sent unchanged.
    Text(String),
    /// Structured value, serialized to JSON text before sending.
    Json(serde_json::Value),
    /// Multipart form, sent unchanged.
    Form(FormData),
}

impl RequestBody {
    /// Converts any serializable value into a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a `validation` error if the value cannot be represented as JSON
    /// (for example a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ClassifiedError> {
        serde_json::to_value(value).map(Self::Json).map_err(|e| {
            ClassifiedError::validation(format!("request body is not serializable: {e}"))
                .with_cause(e)
        })
    }

    /// Returns true for multipart payloads.
    #[must_use]
    pub const fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }
}

/// Body ready for the transport: text or multipart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedBody {
    /// Text payload (raw or serialized JSON).
    Text(String),
    /// Multipart payload.
    Form(FormData),
}

impl TryFrom<RequestBody> for EncodedBody {
    type Error = ClassifiedError;

    fn try_from(body: RequestBody) -> Result<Self, Self::Error> {
        match body {
            RequestBody::Text(text) => Ok(Self::Text(text)),
            RequestBody::Form(form) => Ok(Self::Form(form)),
            RequestBody::Json(value) => serde_json::to_string(&value)
                .map(Self::Text)
                .map_err(|e| {
                    ClassifiedError::validation(format!("failed to serialize body: {e}"))
                        .with_cause(e)
                }),
        }
    }
}
