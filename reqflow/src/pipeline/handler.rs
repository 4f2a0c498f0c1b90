//! The assembled pipeline and the adapters that join its stages.

use super::compose::Interceptor;
use super::stages::{
    BuildFn, DeserializeFn, DeserializeOutput, InitializeFn, SerializeFn, SerializeInput,
    StageFuture, Transport,
};
use crate::context::Context;
use crate::core::{Outcome, Request, WireRequest};
use crate::errors::{Error, SerializationError};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// A composed request pipeline.
///
/// Built once by [`PipelineBuilder`](super::PipelineBuilder) and shared by
/// every call. Calls never share metadata, requests or errors.
pub struct Pipeline<I, O> {
    handler: InitializeFn<I, O>,
}

impl<I, O> Clone for Pipeline<I, O> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<I, O> fmt::Debug for Pipeline<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl<I, O> Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    pub(super) fn assemble(
        initializer: &Arc<dyn Interceptor<InitializeFn<I, O>>>,
        serializer: &Arc<dyn Interceptor<SerializeFn<I, O>>>,
        builder: &Arc<dyn Interceptor<BuildFn<O>>>,
        deserializer: &Arc<dyn Interceptor<DeserializeFn<O>>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let deserialize = deserializer.wrap(send_with(transport));
        let build = builder.wrap(deserialize_with(deserialize));
        let serialize = serializer.wrap(build_with(build));
        let handler = initializer.wrap(serialize_with(serialize));
        Self { handler }
    }

    /// Runs one call.
    ///
    /// The outermost initialize function is invoked exactly once with
    /// `input`. The returned outcome carries the output or error together
    /// with the metadata every stage recorded.
    pub async fn handle(&self, ctx: Context, input: I) -> Outcome<Option<O>> {
        let span = tracing::debug_span!("pipeline.handle");
        (self.handler)(ctx, input).instrument(span).await
    }

    /// Runs one call and drops the metadata.
    pub async fn call(&self, ctx: Context, input: I) -> Result<Option<O>, Error> {
        self.handle(ctx, input).await.into_result()
    }
}

/// Initialize -> Serialize: starts the serialize chain with no request.
fn serialize_with<I, O>(serialize: SerializeFn<I, O>) -> InitializeFn<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    Arc::new(move |ctx: Context, input: I| -> StageFuture<Option<O>> {
        serialize(ctx, SerializeInput::new(input))
    })
}

/// Serialize -> Build: requires the serializers to have produced a request.
fn build_with<I, O>(build: BuildFn<O>) -> SerializeFn<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    Arc::new(move |ctx: Context, input: SerializeInput<I>| -> StageFuture<Option<O>> {
        match input.request {
            Some(request) => build(ctx, request),
            None => Box::pin(async {
                Outcome::err(SerializationError::new(Error::other(
                    "no serializer produced a request",
                )))
            }),
        }
    })
}

/// Build -> Deserialize: materializes the wire request for one attempt.
fn deserialize_with<O>(deserialize: DeserializeFn<O>) -> BuildFn<O>
where
    O: Send + 'static,
{
    Arc::new(move |ctx: Context, request: Request| -> StageFuture<Option<O>> {
        let deserialize = deserialize.clone();
        Box::pin(async move {
            let wire = request.build();
            let outcome = deserialize(ctx, wire.clone()).await;
            wire.close_body();
            outcome.map(|out| out.output)
        })
    })
}

/// Deserialize -> Transport: the innermost function.
fn send_with<O>(transport: Arc<dyn Transport>) -> DeserializeFn<O>
where
    O: Send + 'static,
{
    Arc::new(move |ctx: Context, request: WireRequest| -> StageFuture<DeserializeOutput<O>> {
        let transport = transport.clone();
        Box::pin(async move {
            match transport.send(&ctx, request).await {
                Ok(response) => Outcome::ok(DeserializeOutput::from_response(response)),
                Err(err) => Outcome::err(Error::other(err)),
            }
        })
    })
}
