//! The request binder.
//!
//! A [`Binder`] populates one record per request from up to three sources, in
//! a fixed order:
//!
//! ```text
//! Default -> JSON body (or Data Bag) -> query string -> path parameters -> `id` override
//! ```
//!
//! Each stage writes into the same record instance, so a later stage wins
//! over an earlier one for any field both of them touch. Only a `strict`
//! decode stage can fail the request (and, under
//! [`MismatchPolicy::Reject`], an unbindable path parameter).

use crate::config::{BindConfig, DecodePolicy, MismatchPolicy, PathInjection};
use crate::field::{Bind, IDENTIFIER_FIELD, IDENTIFIER_PARAM};
use crate::json::decode_json;
use crate::query::{apply_query, query_pairs};
use crate::resolve::{self, Mismatch};
use crate::{ExtractionContext, ExtractionError, PathParams};
use bytes::Bytes;
use http::Response;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Binds requests into records according to a [`BindConfig`].
///
/// # Example
///
/// ```rust
/// use hermes_bind::{Bind, BindConfig, Binder, ExtractionContext};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize, Bind)]
/// #[serde(default)]
/// struct GetTask {
///     #[bind(query = "id")]
///     id: String,
///     #[bind(query = "start")]
///     start: String,
///     name: String,
/// }
///
/// let ctx = ExtractionContext::builder()
///     .uri(http::Uri::from_static("/tasks/123?start=2020-01-01"))
///     .json(r#"{"name": "test-name"}"#)
///     .path_param("id", "123")
///     .build();
///
/// let task: GetTask = Binder::new(BindConfig::path()).bind(&ctx).unwrap();
/// assert_eq!(task.id, "123");
/// assert_eq!(task.start, "2020-01-01");
/// assert_eq!(task.name, "test-name");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Binder {
    config: BindConfig,
}

impl From<BindConfig> for Binder {
    fn from(config: BindConfig) -> Self {
        Self::new(config)
    }
}

impl Binder {
    /// Creates a binder.
    #[must_use]
    pub fn new(config: BindConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Builds a record of type `T` from the request.
    pub fn bind<T: Bind>(&self, ctx: &ExtractionContext) -> Result<T, ExtractionError> {
        let mut record = T::default();

        self.bind_body(ctx, &mut record)?;
        self.bind_query(ctx, &mut record)?;

        match self.config.path {
            PathInjection::None => {}
            PathInjection::AllMatchingFields => self.inject_path(ctx.path_params(), &mut record)?,
            PathInjection::IdentifierOnly => {
                self.override_identifier(ctx.path_params(), &mut record)?;
            }
        }

        Ok(record)
    }

    /// Binds the request, then calls `handler` exactly once with the record.
    ///
    /// If binding fails the handler is not called and the error envelope is
    /// returned instead.
    pub fn handle<T, F>(&self, ctx: &ExtractionContext, handler: F) -> Response<Bytes>
    where
        T: Bind,
        F: FnOnce(&ExtractionContext, T) -> Response<Bytes>,
    {
        match self.bind::<T>(ctx) {
            Ok(record) => handler(ctx, record),
            Err(err) => {
                tracing::debug!(
                    method = %ctx.method(),
                    path = ctx.path(),
                    source = %err.source(),
                    error = %err,
                    "request binding failed"
                );
                err.into_response()
            }
        }
    }

    /// Wraps `handler` into a reusable request handler.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hermes_bind::response::JsonResponse;
    /// use hermes_bind::{Bind, BindConfig, Binder, ExtractionContext};
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Debug, Default, Deserialize, Serialize, Bind)]
    /// #[serde(default)]
    /// struct Rename {
    ///     id: String,
    ///     name: String,
    /// }
    ///
    /// let handler = Binder::new(BindConfig::json_body())
    ///     .wrap(|_ctx: &ExtractionContext, req: Rename| JsonResponse::new(req).into_response());
    ///
    /// let ctx = ExtractionContext::builder()
    ///     .json(r#"{"name":"#)
    ///     .path_param("id", "123")
    ///     .build();
    /// assert_eq!(handler(&ctx).status(), http::StatusCode::BAD_REQUEST);
    /// ```
    pub fn wrap<T, F>(
        self,
        handler: F,
    ) -> impl Fn(&ExtractionContext) -> Response<Bytes> + Send + Sync
    where
        T: Bind,
        F: Fn(&ExtractionContext, T) -> Response<Bytes> + Send + Sync,
    {
        move |ctx: &ExtractionContext| self.handle::<T, _>(ctx, &handler)
    }

    /// Wraps `handler`, passing a shared service alongside the record.
    ///
    /// The service is shared across requests and only ever borrowed.
    pub fn wrap_with_service<T, S, F>(
        self,
        handler: F,
        service: Arc<S>,
    ) -> impl Fn(&ExtractionContext) -> Response<Bytes> + Send + Sync
    where
        T: Bind,
        S: Send + Sync + ?Sized,
        F: Fn(&ExtractionContext, T, &S) -> Response<Bytes> + Send + Sync,
    {
        move |ctx: &ExtractionContext| {
            self.handle(ctx, |ctx: &ExtractionContext, record: T| {
                handler(ctx, record, &*service)
            })
        }
    }

    fn bind_body<T: Bind>(
        &self,
        ctx: &ExtractionContext,
        record: &mut T,
    ) -> Result<(), ExtractionError> {
        if self.config.body == DecodePolicy::Ignore {
            return Ok(());
        }

        let limit = self.config.max_body_size;
        let outcome = match T::data_bag() {
            Some(bag) => decode_json::<Map<String, Value>>(ctx.body(), limit).map(|map| {
                tracing::debug!(
                    field = bag.name,
                    keys = map.len(),
                    "captured body into data bag"
                );
                bag.set_bag(record, map);
            }),
            None => decode_json::<T>(ctx.body(), limit).map(|decoded| *record = decoded),
        };

        Self::settle(self.config.body, outcome)
    }

    fn bind_query<T: Bind>(
        &self,
        ctx: &ExtractionContext,
        record: &mut T,
    ) -> Result<(), ExtractionError> {
        if self.config.query == DecodePolicy::Ignore {
            return Ok(());
        }

        let query = ctx.query_string().unwrap_or("");
        let outcome = query_pairs(query)
            .and_then(|pairs| apply_query(record, T::fields(), &pairs))
            .map(|written| tracing::trace!(written, "applied query string"));

        Self::settle(self.config.query, outcome)
    }

    fn inject_path<T: Bind>(
        &self,
        params: &PathParams,
        record: &mut T,
    ) -> Result<(), ExtractionError> {
        for (name, value) in params {
            match resolve::lookup(T::fields(), name) {
                Ok(field) => {
                    resolve::assign(record, Some(field), value);
                }
                Err(mismatch) => self.mismatch(name, mismatch)?,
            }
        }
        Ok(())
    }

    fn override_identifier<T: Bind>(
        &self,
        params: &PathParams,
        record: &mut T,
    ) -> Result<(), ExtractionError> {
        let Some(id) = params.get(IDENTIFIER_PARAM).filter(|id| !id.is_empty()) else {
            return Ok(());
        };

        match resolve::lookup_exact(T::fields(), IDENTIFIER_FIELD) {
            Ok(field) => {
                resolve::assign(record, Some(field), id);
                Ok(())
            }
            Err(mismatch) => self.mismatch(IDENTIFIER_PARAM, mismatch),
        }
    }

    fn settle(
        policy: DecodePolicy,
        outcome: Result<(), ExtractionError>,
    ) -> Result<(), ExtractionError> {
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if policy == DecodePolicy::Strict => Err(err),
            Err(err) => {
                tracing::debug!(
                    source = %err.source(),
                    error = %err,
                    "ignoring best-effort decode failure"
                );
                Ok(())
            }
        }
    }

    fn mismatch(&self, param: &str, mismatch: Mismatch) -> Result<(), ExtractionError> {
        match self.config.mismatches {
            MismatchPolicy::Silent => Ok(()),
            MismatchPolicy::Trace => {
                tracing::warn!(param, reason = %mismatch, "path parameter not bound");
                Ok(())
            }
            MismatchPolicy::Reject => Err(ExtractionError::field_mismatch(param, mismatch)),
        }
    }
}
