//! JSON body decoding.
//!
//! [`decode_json`] is the single place the body is handed to `serde_json`;
//! both the binder and the standalone [`Json`] extractor go through it.

use crate::config::DEFAULT_MAX_BODY_SIZE;
use crate::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
use serde::de::DeserializeOwned;
use std::ops::Deref;

/// Decodes a JSON body, enforcing `limit`.
///
/// An empty body is a decode failure, as is a body over the limit.
pub fn decode_json<T: DeserializeOwned>(body: &[u8], limit: usize) -> Result<T, ExtractionError> {
    if body.len() > limit {
        return Err(ExtractionError::payload_too_large(limit, body.len()));
    }

    if body.is_empty() {
        return Err(ExtractionError::deserialization_failed(
            ExtractionSource::Body,
            "empty request body",
        ));
    }

    serde_json::from_slice(body)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string()))
}

/// Extractor for a JSON body decoded on its own, without field merging.
///
/// # Example
///
/// ```rust
/// use hermes_bind::{ExtractionContext, FromRequest, Json};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Rename {
///     name: String,
/// }
///
/// let ctx = ExtractionContext::builder()
///     .json(r#"{"name": "renamed"}"#)
///     .build();
///
/// let Json(body) = Json::<Rename>::from_request(&ctx).unwrap();
/// assert_eq!(body.name, "renamed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Consumes the Json and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Json<T> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        decode_json(ctx.body(), DEFAULT_MAX_BODY_SIZE).map(Json)
    }
}
