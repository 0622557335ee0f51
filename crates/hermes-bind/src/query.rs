//! Query string decoding.
//!
//! The binder does not deserialize the query into a fresh value: it decodes
//! the raw string into ordered pairs and writes each field that declares a
//! query key, so values already taken from the body survive unless the query
//! names the same field.

use crate::field::FieldDescriptor;
use crate::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
use serde::de::DeserializeOwned;
use std::ops::Deref;

/// Decodes a raw query string into percent-decoded pairs, in order.
pub fn query_pairs(query: &str) -> Result<Vec<(String, String)>, ExtractionError> {
    serde_urlencoded::from_str(query)
        .map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string())
        })
}

/// Writes every field whose query key appears in `pairs`.
///
/// When a key repeats, its first occurrence is used. Returns the number of
/// fields written.
pub fn apply_query<T>(
    record: &mut T,
    fields: &[FieldDescriptor<T>],
    pairs: &[(String, String)],
) -> Result<usize, ExtractionError> {
    let mut written = 0;

    for field in fields {
        let Some(key) = field.query_key else {
            continue;
        };
        let Some((_, raw)) = pairs.iter().find(|(k, _)| k == key) else {
            continue;
        };

        let stored = field.set_raw(record, raw).map_err(|details| {
            ExtractionError::invalid_type(ExtractionSource::Query, key, details)
        })?;
        if stored {
            written += 1;
        }
    }

    Ok(written)
}

/// Extractor deserializing the whole query string into `T`.
///
/// # Example
///
/// ```rust
/// use hermes_bind::{ExtractionContext, FromRequest, Query};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Range {
///     start: String,
///     stop: String,
/// }
///
/// let ctx = ExtractionContext::builder()
///     .uri(http::Uri::from_static("/events?start=2020-01-01&stop=2025-01-01"))
///     .build();
///
/// let Query(range) = Query::<Range>::from_request(&ctx).unwrap();
/// assert_eq!(range.start, "2020-01-01");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query<T>(pub T);

impl<T> Query<T> {
    /// Consumes the Query and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: DeserializeOwned> FromRequest for Query<T> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        let query_string = ctx.query_string().unwrap_or("");

        serde_urlencoded::from_str(query_string).map(Query).map_err(|e| {
            ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string())
        })
    }
}
