//! Core extractor trait.
//!
//! [`FromRequest`] is how a handler argument is produced from an
//! [`ExtractionContext`]. The binder's [`Bound`](crate::Bound) record is one
//! implementation; [`Json`](crate::Json) and [`Query`](crate::Query) are the
//! plain, non-merging ones.

use crate::{ExtractionContext, ExtractionError};

/// Trait for types that can be extracted from an HTTP request.
///
/// Extraction is synchronous: it reads the already-buffered request once.
///
/// # Example
///
/// ```rust
/// use hermes_bind::{ExtractionContext, ExtractionError, ExtractionSource, FromRequest};
///
/// struct Tenant(String);
///
/// impl FromRequest for Tenant {
///     fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
///         ctx.path_params()
///             .get("tenant")
///             .map(|t| Tenant(t.to_string()))
///             .ok_or_else(|| ExtractionError::field_mismatch("tenant", "no tenant segment"))
///     }
/// }
///
/// let ctx = ExtractionContext::builder().path_param("tenant", "acme").build();
/// assert_eq!(Tenant::from_request(&ctx).unwrap().0, "acme");
/// ```
pub trait FromRequest: Sized {
    /// Extracts this type from the request context.
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError>;
}

// `None` instead of an error.
impl<T: FromRequest> FromRequest for Option<T> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        Ok(T::from_request(ctx).ok())
    }
}

// Lets a handler inspect the failure itself.
impl<T: FromRequest> FromRequest for Result<T, ExtractionError> {
    fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
        Ok(T::from_request(ctx))
    }
}

macro_rules! impl_from_request_for_tuple {
    ($($T:ident),*) => {
        impl<$($T: FromRequest),*> FromRequest for ($($T,)*) {
            fn from_request(ctx: &ExtractionContext) -> Result<Self, ExtractionError> {
                Ok(($($T::from_request(ctx)?,)*))
            }
        }
    };
}

impl_from_request_for_tuple!(T1, T2);
impl_from_request_for_tuple!(T1, T2, T3);
impl_from_request_for_tuple!(T1, T2, T3, T4);
