//! Derive macro for Hermes request binding.
//!
//! `#[derive(Bind)]` implements `hermes_bind::Bind` for a struct with named
//! fields by generating its field descriptor table. Use it through the
//! re-export in `hermes-bind`, which the generated code refers to as
//! `::hermes_bind`.
//!
//! # Field kinds
//!
//! | Field type | Kind | Written from |
//! |------------|------|--------------|
//! | `String` | text | query (if keyed), path parameters |
//! | integers, floats, `bool`, `char`, `Option<_>` of those | scalar | query (if keyed) |
//! | any other plain type with `#[bind(query = "...")]` | scalar, via `FromStr` | query |
//! | `data: Map<String, Value>` or `#[bind(data)]` | data bag | the whole JSON body |
//! | anything else | other | never |
//!
//! # Attributes
//!
//! - `#[bind(query = "key")]`: read the field from query key `key`
//! - `#[bind(path = "name")]`: also answer to path parameter `name`
//! - `#[bind(rename = "Name")]`: match path parameters against `Name`
//!   instead of the Rust identifier
//! - `#[bind(readonly)]`: never written by the binder
//! - `#[bind(data)]`: mark a map field as the Data Bag

mod expand;
mod parse;

use proc_macro::TokenStream;

/// Derives `hermes_bind::Bind`.
///
/// # Example
///
/// ```rust,ignore
/// use hermes_bind::Bind;
/// use serde::Deserialize;
///
/// #[derive(Default, Deserialize, Bind)]
/// #[serde(default)]
/// struct ListTasks {
///     #[bind(query = "owner")]
///     owner: String,
///     #[bind(query = "limit")]
///     limit: Option<u32>,
///     #[bind(readonly)]
///     etag: String,
/// }
/// ```
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(input: TokenStream) -> TokenStream {
    expand::expand_bind(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
