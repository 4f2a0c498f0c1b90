//! Call identity: the service and operation a call belongs to.

use crate::context::Context;
use crate::core::{Key, Metadata};
use crate::errors::{Error, OperationError};
use crate::pipeline::{InitializeFn, Interceptor, StageFuture};
use std::sync::Arc;

/// Metadata and context key for the service name.
#[derive(Debug)]
pub struct ServiceNameKey;

impl Key for ServiceNameKey {
    type Value = String;
}

/// Metadata and context key for the operation name.
#[derive(Debug)]
pub struct OperationNameKey;

impl Key for OperationNameKey {
    type Value = String;
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Returns the service name stamped into the context.
#[must_use]
pub fn service_name_from_context(ctx: &Context) -> Option<&str> {
    non_empty(ctx.value::<ServiceNameKey>())
}

/// Returns the operation name stamped into the context.
#[must_use]
pub fn operation_name_from_context(ctx: &Context) -> Option<&str> {
    non_empty(ctx.value::<OperationNameKey>())
}

/// Returns the service name recorded in the metadata.
#[must_use]
pub fn service_name_from_metadata(md: &Metadata) -> Option<&str> {
    non_empty(md.get::<ServiceNameKey>())
}

/// Returns the operation name recorded in the metadata.
#[must_use]
pub fn operation_name_from_metadata(md: &Metadata) -> Option<&str> {
    non_empty(md.get::<OperationNameKey>())
}

/// Stamps the call identity.
///
/// Inner stages see the names in the context. Outer stages see them in the
/// returned metadata, whether or not the call failed.
#[derive(Debug, Clone)]
pub struct ServiceOperationInitializer {
    service: String,
    operation: String,
}

impl ServiceOperationInitializer {
    /// Creates the initializer.
    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
        }
    }
}

impl<I, O> Interceptor<InitializeFn<I, O>> for ServiceOperationInitializer
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn wrap(&self, next: InitializeFn<I, O>) -> InitializeFn<I, O> {
        let service = self.service.clone();
        let operation = self.operation.clone();
        Arc::new(move |ctx: Context, input: I| -> StageFuture<Option<O>> {
            let ctx = ctx
                .with_value::<ServiceNameKey>(service.clone())
                .with_value::<OperationNameKey>(operation.clone());
            let inner = next(ctx, input);
            let service = service.clone();
            let operation = operation.clone();
            Box::pin(async move {
                let mut outcome = inner.await;
                outcome.metadata.set::<ServiceNameKey>(service);
                outcome.metadata.set::<OperationNameKey>(operation);
                outcome
            })
        })
    }
}

/// Wraps a failed call's error in an [`OperationError`].
///
/// Names are taken from the context first and the metadata second. With no
/// identity at all, or when the error already is an operation error, the
/// error passes through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapOperationErrorInitializer;

impl<I, O> Interceptor<InitializeFn<I, O>> for WrapOperationErrorInitializer
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn wrap(&self, next: InitializeFn<I, O>) -> InitializeFn<I, O> {
        Arc::new(move |ctx: Context, input: I| -> StageFuture<Option<O>> {
            let service = service_name_from_context(&ctx).map(str::to_owned);
            let operation = operation_name_from_context(&ctx).map(str::to_owned);
            let inner = next(ctx, input);
            Box::pin(async move {
                let mut outcome = inner.await;
                let Some(err) = outcome.error.take() else {
                    return outcome;
                };
                let service = service.or_else(|| {
                    service_name_from_metadata(&outcome.metadata).map(str::to_owned)
                });
                let operation = operation.or_else(|| {
                    operation_name_from_metadata(&outcome.metadata).map(str::to_owned)
                });
                outcome.error = Some(match (service, operation) {
                    _ if matches!(err, Error::Operation(_)) => err,
                    (None, None) => err,
                    (service, operation) => OperationError::new(
                        service.unwrap_or_default(),
                        operation.unwrap_or_default(),
                        err,
                    )
                    .into(),
                });
                outcome
            })
        })
    }
}
