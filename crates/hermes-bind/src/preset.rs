//! Preset-typed extraction.
//!
//! [`Bound<T, P>`] runs the binder with the preset named by `P`, so the
//! binding mode is part of a handler's signature:
//!
//! ```rust
//! use hermes_bind::{Bind, Bound, ExtractionContext, FromRequest, JsonBodyPreset};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Deserialize, Bind)]
//! #[serde(default)]
//! struct Rename {
//!     id: String,
//!     name: String,
//! }
//!
//! let ctx = ExtractionContext::builder()
//!     .json(r#"{"id": "ignored", "name": "renamed"}"#)
//!     .path_param("id", "42")
//!     .build();
//!
//! let req = Bound::<Rename, JsonBodyPreset>::from_request(&ctx).unwrap();
//! assert_eq!(req.id, "42");
//! assert_eq!(req.name, "renamed");
//! ```

use crate::{Bind, BindConfig, Binder, ExtractionContext, ExtractionError, FromRequest};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// A named binding configuration.
pub trait Preset {
    /// Returns the configuration this preset stands for.
    fn config() -> BindConfig;
}

/// [`BindConfig::path`]: best-effort body and query, every path parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPreset;

/// [`BindConfig::json_body`]: strict body, `id` override.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyPreset;

/// [`BindConfig::query`]: strict query, `id` override.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryPreset;

/// [`BindConfig::path_with_body`]: best-effort body, every path parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathWithBodyPreset;

impl Preset for PathPreset {
    fn config() -> BindConfig {
        BindConfig::path()
    }
}

impl Preset for JsonBodyPreset {
    fn config() -> BindConfig {
        BindConfig::json_body()
    }
}

impl Preset for QueryPreset {
    fn config() -> BindConfig {
        BindConfig::query()
    }
}

impl Preset for PathWithBodyPreset {
    fn config() -> BindConfig {
        BindConfig::path_with_body()
    }
}

/// A record bound from the request under preset `P`.
pub struct Bound<T, P = PathPreset> {
    record: T,
    preset: PhantomData<fn() -> P>,
}

impl<T, P> Bound<T, P> {
    /// Consumes the wrapper and returns the record.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.record
    }
}

impl<T: fmt::Debug, P> fmt::Debug for Bound<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bound").field(&self.record).finish()
    }
}

impl<T, P> Deref for Bound<T, P> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

impl<T, P> DerefMut for Bound<T, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.record
    }
}

impl<T: Bind, P: Preset> FromRequest for Bound<T, P> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        Binder::new(P::config()).bind(ctx).map(|record| Self {
            record,
            preset: PhantomData,
        })
    }
}
