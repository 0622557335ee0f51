//! Response builders.
//!
//! Handlers own the response once binding succeeds; these builders cover the
//! two shapes the binding layer itself needs, a JSON payload and the
//! `{"error": "..."}` envelope written when a strict stage fails.

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use serde::Serialize;

const APPLICATION_JSON: &str = "application/json";

fn json_response(status: StatusCode, body: Vec<u8>) -> Response<Bytes> {
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}

/// JSON response builder.
///
/// # Example
///
/// ```rust
/// use hermes_bind::response::JsonResponse;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Task {
///     id: String,
/// }
///
/// let response = JsonResponse::new(Task { id: "123".into() }).into_response();
/// assert_eq!(response.status(), http::StatusCode::OK);
/// ```
#[derive(Debug)]
pub struct JsonResponse<T> {
    data: T,
    status: StatusCode,
}

impl<T: Serialize> JsonResponse<T> {
    /// Creates a new JSON response with status 200 OK.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
        }
    }

    /// Sets a custom status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Builds the HTTP response.
    ///
    /// A payload that fails to serialize becomes a 500 error envelope.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        match serde_json::to_vec(&self.data) {
            Ok(body) => json_response(self.status, body),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize response body");
                ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
                    .into_response()
            }
        }
    }
}

/// The `{"error": "<message>"}` envelope.
///
/// # Example
///
/// ```rust
/// use hermes_bind::response::ErrorResponse;
/// use http::StatusCode;
///
/// let response = ErrorResponse::bad_request("unexpected end of input").into_response();
/// assert_eq!(response.status(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a str,
}

impl ErrorResponse {
    /// Creates a new error response.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Builds the HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let envelope = ErrorEnvelope {
            error: &self.message,
        };
        // A struct holding one string always serializes.
        let body = serde_json::to_vec(&envelope).unwrap_or_default();
        json_response(self.status, body)
    }
}
