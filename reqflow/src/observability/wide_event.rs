//! One structured event per call.

use crate::context::Context;
use crate::pipeline::{InitializeFn, Interceptor, StageFuture};
use crate::request::{
    operation_name_from_context, operation_name_from_metadata, service_name_from_context,
    service_name_from_metadata,
};
use crate::response::request_id;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Emits a wide event when a call returns.
///
/// The event carries `service`, `operation`, `request_id`, `elapsed_ms` and
/// `outcome`, plus `error` when the call failed. Successful calls log at
/// `INFO`, failed ones at `WARN`. Place it outside
/// [`ServiceOperationInitializer`](crate::request::ServiceOperationInitializer)
/// to pick the identity up from metadata, or inside it to read the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInitializer;

impl<I, O> Interceptor<InitializeFn<I, O>> for TracingInitializer
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn wrap(&self, next: InitializeFn<I, O>) -> InitializeFn<I, O> {
        Arc::new(move |ctx: Context, input: I| -> StageFuture<Option<O>> {
            let service = service_name_from_context(&ctx).map(str::to_owned);
            let operation = operation_name_from_context(&ctx).map(str::to_owned);
            let started = Instant::now();
            let inner = next(ctx, input);
            Box::pin(async move {
                let outcome = inner.await;
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                let md = &outcome.metadata;
                let service = service
                    .as_deref()
                    .or_else(|| service_name_from_metadata(md))
                    .unwrap_or_default();
                let operation = operation
                    .as_deref()
                    .or_else(|| operation_name_from_metadata(md))
                    .unwrap_or_default();
                let request_id = request_id(md).unwrap_or_default();

                match &outcome.error {
                    None => info!(
                        service,
                        operation,
                        request_id,
                        elapsed_ms,
                        outcome = "success",
                        "Call finished"
                    ),
                    Some(err) => warn!(
                        service,
                        operation,
                        request_id,
                        elapsed_ms,
                        outcome = "error",
                        error = %err,
                        "Call failed"
                    ),
                }
                outcome
            })
        })
    }
}
