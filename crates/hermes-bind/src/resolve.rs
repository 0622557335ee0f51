//! Field resolution for name/value pairs.
//!
//! Maps an external name (a path parameter) onto a record field. Names are
//! compared case-insensitively against every field's source-level name first;
//! declared path keys are only consulted when no field is named that way. In
//! either pass the first field in declaration order is the candidate; if that
//! field is not a settable text field the lookup fails, later fields are not
//! considered.

use crate::field::{FieldDescriptor, FieldKind};
use std::fmt;

/// Why a name did not resolve to a writable text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mismatch {
    /// No field answers to the name.
    Unknown,
    /// The field exists but is not text.
    WrongKind(FieldKind),
    /// The field exists but is read-only.
    ReadOnly,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "no field with that name"),
            Self::WrongKind(kind) => write!(f, "field is {kind}, not text"),
            Self::ReadOnly => write!(f, "field is read-only"),
        }
    }
}

fn check<T>(field: &FieldDescriptor<T>) -> Result<&FieldDescriptor<T>, Mismatch> {
    if field.kind != FieldKind::Text {
        return Err(Mismatch::WrongKind(field.kind));
    }
    if !field.is_settable() {
        return Err(Mismatch::ReadOnly);
    }
    Ok(field)
}

/// Looks up `name` case-insensitively, reporting why it did not resolve.
pub fn lookup<'a, T>(
    fields: &'a [FieldDescriptor<T>],
    name: &str,
) -> Result<&'a FieldDescriptor<T>, Mismatch> {
    let wanted = name.to_lowercase();
    fields
        .iter()
        .find(|field| field.is_named(&wanted))
        .or_else(|| fields.iter().find(|field| field.is_aliased(&wanted)))
        .ok_or(Mismatch::Unknown)
        .and_then(check)
}

/// Looks up a field by its exact, case-sensitive source-level name.
pub fn lookup_exact<'a, T>(
    fields: &'a [FieldDescriptor<T>],
    name: &str,
) -> Result<&'a FieldDescriptor<T>, Mismatch> {
    fields
        .iter()
        .find(|field| field.name == name)
        .ok_or(Mismatch::Unknown)
        .and_then(check)
}

/// Resolves `name` to a settable text field, if any.
///
/// # Example
///
/// ```rust
/// use hermes_bind::{resolve, Bind};
/// use serde::Deserialize;
///
/// #[derive(Default, Deserialize, Bind)]
/// struct Lookup {
///     id: String,
///     page: u32,
/// }
///
/// assert!(resolve::resolve(Lookup::fields(), "ID").is_some());
/// assert!(resolve::resolve(Lookup::fields(), "page").is_none());
/// assert!(resolve::resolve(Lookup::fields(), "missing").is_none());
/// ```
pub fn resolve<'a, T>(
    fields: &'a [FieldDescriptor<T>],
    name: &str,
) -> Option<&'a FieldDescriptor<T>> {
    lookup(fields, name).ok()
}

/// Writes `value` into the resolved field. No-op when nothing resolved.
///
/// Returns true if a write happened.
pub fn assign<T>(record: &mut T, field: Option<&FieldDescriptor<T>>, value: &str) -> bool {
    field.is_some_and(|field| field.set_text(record, value))
}
