//! Field descriptor tables for bindable records.
//!
//! A record opts into binding by implementing [`Bind`], normally through
//! `#[derive(Bind)]`. The implementation is a static table with one
//! [`FieldDescriptor`] per field, in declaration order, describing the names
//! the field answers to and how to write into it.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// Name of the conventional identifier field.
pub const IDENTIFIER_FIELD: &str = "id";

/// Path parameter that feeds the conventional identifier field.
pub const IDENTIFIER_PARAM: &str = "id";

/// Name of the conventional Data Bag field.
pub const DATA_BAG_FIELD: &str = "data";

/// A record that can be populated from a request.
///
/// The JSON body is decoded through the record's own `Deserialize`
/// implementation, so JSON key names follow serde attributes. Records should
/// carry `#[serde(default)]` so keys missing from the body keep their zero
/// value instead of failing the decode.
///
/// # Example
///
/// ```rust
/// use hermes_bind::{Bind, FieldKind};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize, Bind)]
/// #[serde(default)]
/// struct GetTask {
///     #[bind(query = "id", path = "id")]
///     id: String,
///     #[bind(query = "limit")]
///     limit: u32,
///     name: String,
/// }
///
/// let fields = GetTask::fields();
/// assert_eq!(fields.len(), 3);
/// assert_eq!(fields[0].name, "id");
/// assert_eq!(fields[1].kind, FieldKind::Scalar);
/// assert!(GetTask::data_bag().is_none());
/// ```
pub trait Bind: Default + DeserializeOwned + Sized + 'static {
    /// Returns the descriptor table, in field declaration order.
    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Returns the Data Bag field, if the record declares a settable one.
    fn data_bag() -> Option<&'static FieldDescriptor<Self>> {
        Self::fields()
            .iter()
            .find(|field| field.kind == FieldKind::DataBag && field.is_settable())
    }
}

/// What kind of value a field holds, as far as binding is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A `String`. The only kind path parameters are written into.
    Text,
    /// A value parsed from its string form (numbers, booleans, `Option<T>`).
    Scalar,
    /// A string-keyed map receiving the whole JSON body.
    DataBag,
    /// Anything else; never written by the binder.
    Other,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Scalar => write!(f, "scalar"),
            Self::DataBag => write!(f, "data bag"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// How to write into a field.
pub enum Setter<T> {
    /// Direct access to a `String` field.
    Text(fn(&mut T) -> &mut String),
    /// Parses the raw string and stores the result.
    Parse(fn(&mut T, &str) -> Result<(), String>),
    /// Stores a decoded JSON object.
    Bag(fn(&mut T, Map<String, Value>)),
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Setter<T> {}

/// One entry of a record's descriptor table.
///
/// Fields are public so that generated code can build tables in constant
/// context.
pub struct FieldDescriptor<T> {
    /// Source-level field name (after `#[bind(rename)]`).
    pub name: &'static str,
    /// Query-string key, if the field is bound from the query.
    pub query_key: Option<&'static str>,
    /// Extra path parameter name the field answers to.
    pub path_key: Option<&'static str>,
    /// Value kind.
    pub kind: FieldKind,
    /// Writer, or `None` for read-only fields.
    pub setter: Option<Setter<T>>,
}

impl<T> Clone for FieldDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldDescriptor<T> {}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("query_key", &self.query_key)
            .field("path_key", &self.path_key)
            .field("kind", &self.kind)
            .field("settable", &self.is_settable())
            .finish()
    }
}

impl<T> FieldDescriptor<T> {
    /// Returns true if the binder may write into this field.
    #[must_use]
    pub fn is_settable(&self) -> bool {
        self.setter.is_some()
    }

    /// Returns true if the source-level name equals `lowercase_name`, which
    /// must already be lowercased.
    pub(crate) fn is_named(&self, lowercase_name: &str) -> bool {
        self.name.to_lowercase() == lowercase_name
    }

    /// Returns true if the path key equals `lowercase_name`.
    pub(crate) fn is_aliased(&self, lowercase_name: &str) -> bool {
        self.path_key
            .is_some_and(|key| key.to_lowercase() == lowercase_name)
    }

    /// Writes a text value. Returns false if this is not a settable text field.
    pub fn set_text(&self, record: &mut T, value: &str) -> bool {
        match self.setter {
            Some(Setter::Text(slot)) => {
                value.clone_into(slot(record));
                true
            }
            _ => false,
        }
    }

    /// Writes a raw string, parsing it for scalar fields.
    ///
    /// Returns `Ok(false)` if the field cannot take a string at all.
    pub fn set_raw(&self, record: &mut T, raw: &str) -> Result<bool, String> {
        match self.setter {
            Some(Setter::Text(slot)) => {
                raw.clone_into(slot(record));
                Ok(true)
            }
            Some(Setter::Parse(parse)) => parse(record, raw).map(|()| true),
            Some(Setter::Bag(_)) | None => Ok(false),
        }
    }

    /// Stores a decoded JSON object. Returns false if this is not a bag.
    pub fn set_bag(&self, record: &mut T, map: Map<String, Value>) -> bool {
        match self.setter {
            Some(Setter::Bag(store)) => {
                store(record, map);
                true
            }
            _ => false,
        }
    }
}
