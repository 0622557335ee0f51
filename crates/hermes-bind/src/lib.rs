//! # Hermes Bind
//!
//! Request binding for Hermes HTTP handlers.
//!
//! A handler receives one record built from up to three parts of the request:
//!
//! | Source | How it is written | Preset default |
//! |--------|-------------------|----------------|
//! | JSON body | decoded into the whole record, or captured into a Data Bag | best-effort |
//! | Query string | fields tagged `#[bind(query = "...")]` | best-effort |
//! | Path parameters | case-insensitive match on text field names | all matching |
//!
//! The sources are applied in that order into the same record, then a
//! non-empty `id` path parameter is written into the `id` field. Each source
//! has a [`DecodePolicy`]; only a `strict` failure stops the request.
//!
//! ## Example
//!
//! ```rust
//! use hermes_bind::response::JsonResponse;
//! use hermes_bind::{Bind, BindConfig, Binder, ExtractionContext};
//! use http::{StatusCode, Uri};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Deserialize, Serialize, Bind)]
//! #[serde(default)]
//! struct TestRequest {
//!     #[bind(query = "id")]
//!     id: String,
//!     #[bind(query = "start")]
//!     start: String,
//!     #[bind(query = "stop")]
//!     stop: String,
//!     name: String,
//! }
//!
//! let binder = Binder::new(BindConfig::path());
//! let handler = binder.wrap(|_ctx: &ExtractionContext, req: TestRequest| {
//!     JsonResponse::new(req).into_response()
//! });
//!
//! let ctx = ExtractionContext::builder()
//!     .uri(Uri::from_static("/test/123?start=2020-01-01&stop=2025-01-01"))
//!     .json(r#"{"name": "test-name"}"#)
//!     .path_param("id", "123")
//!     .build();
//!
//! let response = handler(&ctx);
//! assert_eq!(response.status(), StatusCode::OK);
//!
//! let echoed: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
//! assert_eq!(echoed["id"], "123");
//! assert_eq!(echoed["start"], "2020-01-01");
//! assert_eq!(echoed["name"], "test-name");
//! ```
//!
//! ## Error Handling
//!
//! Binding failures are [`ExtractionError`]s and render as
//! `{"error": "<message>"}`:
//!
//! ```rust
//! use hermes_bind::{ExtractionError, ExtractionSource};
//!
//! let err = ExtractionError::invalid_type(
//!     ExtractionSource::Query,
//!     "limit",
//!     "invalid digit found in string",
//! );
//! assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Lets `#[derive(Bind)]` output name `::hermes_bind` from inside this crate.
extern crate self as hermes_bind;

mod binder;
mod config;
mod context;
mod error;
mod extractor;
mod field;
mod json;
mod params;
mod preset;
mod query;
pub mod resolve;
pub mod response;

pub use binder::Binder;
pub use config::{
    BindConfig, ConfigLoader, DecodePolicy, MismatchPolicy, PathInjection, DEFAULT_MAX_BODY_SIZE,
};
pub use context::{ExtractionContext, ExtractionContextBuilder};
pub use error::{ConfigError, ExtractionError, ExtractionSource};
pub use extractor::FromRequest;
pub use field::{
    Bind, FieldDescriptor, FieldKind, Setter, DATA_BAG_FIELD, IDENTIFIER_FIELD, IDENTIFIER_PARAM,
};
pub use json::{decode_json, Json};
pub use params::PathParams;
pub use preset::{Bound, JsonBodyPreset, PathPreset, PathWithBodyPreset, Preset, QueryPreset};
pub use query::{apply_query, query_pairs, Query};

pub use hermes_bind_macros::Bind;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::{Map, Value};
}
