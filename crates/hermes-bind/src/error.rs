//! Error types.
//!
//! [`ExtractionError`] is what a strict binding stage reports back to the
//! caller. [`ConfigError`] covers loading a [`BindConfig`](crate::BindConfig).

use crate::response::ErrorResponse;
use bytes::Bytes;
use http::{Response, StatusCode};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Where the binder was reading from when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Path parameters (e.g., `/tasks/{id}`)
    Path,
    /// Query string parameters
    Query,
    /// JSON request body
    Body,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Query => write!(f, "query"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// A binding failure.
///
/// Decode failures carry the decoder's own message unchanged, so the
/// `{"error": ...}` body a client sees is exactly what `serde_json` or the
/// query parser reported.
///
/// # Example
///
/// ```rust
/// use hermes_bind::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::deserialization_failed(
///     ExtractionSource::Body,
///     "EOF while parsing a value at line 1 column 8",
/// );
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.to_string(), "EOF while parsing a value at line 1 column 8");
/// ```
#[derive(Debug)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    /// The decoder rejected the input
    DeserializationFailed,
    /// A single value could not be parsed into its field type
    InvalidType,
    /// Body exceeds the configured limit
    PayloadTooLarge,
    /// A path parameter had no usable field, reported under the reject policy
    FieldMismatch,
}

impl ExtractionError {
    /// Creates an error for a decoder failure, keeping its message verbatim.
    #[must_use]
    pub fn deserialization_failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: error.into(),
            field: None,
        }
    }

    /// Creates an error for a value that does not parse into its field type.
    #[must_use]
    pub fn invalid_type(
        source: ExtractionSource,
        field: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        let field = field.into();
        let details = details.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::InvalidType,
            message: format!("invalid {source} parameter '{field}': {details}"),
            field: Some(field),
        }
    }

    /// Creates an error for a body over the configured limit.
    #[must_use]
    pub fn payload_too_large(max_size: usize, actual_size: usize) -> Self {
        Self {
            extraction_source: ExtractionSource::Body,
            kind: ExtractionErrorKind::PayloadTooLarge,
            message: format!("payload too large: max {max_size} bytes, got {actual_size} bytes"),
            field: None,
        }
    }

    /// Creates an error for a path parameter that did not bind to any field.
    #[must_use]
    pub fn field_mismatch(param: impl Into<String>, reason: impl fmt::Display) -> Self {
        let param = param.into();
        Self {
            extraction_source: ExtractionSource::Path,
            kind: ExtractionErrorKind::FieldMismatch,
            message: format!("path parameter '{param}' not bound: {reason}"),
            field: Some(param),
        }
    }

    /// Returns the source being read when the error occurred.
    #[must_use]
    pub fn source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns the field or parameter name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns true for errors caused by the client's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ExtractionErrorKind::DeserializationFailed | ExtractionErrorKind::InvalidType => {
                StatusCode::BAD_REQUEST
            }
            ExtractionErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ExtractionErrorKind::FieldMismatch => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::DeserializationFailed => "DESERIALIZATION_FAILED",
            ExtractionErrorKind::InvalidType => "INVALID_PARAMETER",
            ExtractionErrorKind::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ExtractionErrorKind::FieldMismatch => "FIELD_MISMATCH",
        }
    }

    /// Renders the `{"error": "<message>"}` response for this error.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        ErrorResponse::new(self.status_code(), self.message).into_response()
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}

/// Errors that can occur while loading a binding configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Format other than TOML or JSON.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field with the invalid value.
        field: String,
        /// Explanation of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
