//! Fluent pipeline assembly.

use super::compose::{compose, Interceptor};
use super::handler::Pipeline;
use super::stages::{BuildFn, DeserializeFn, InitializeFn, SerializeFn, Transport};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised when assembling a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No transport was given.
    #[error("pipeline has no transport")]
    MissingTransport,

    /// No serializer was given, so no request would ever be built.
    #[error("pipeline has no serializer")]
    MissingSerializer,
}

/// Builder for [`Pipeline`].
///
/// Interceptors run in the order they were added within each stage: the
/// first initializer added is the outermost function of the whole call.
pub struct PipelineBuilder<I, O> {
    initializers: Vec<Arc<dyn Interceptor<InitializeFn<I, O>>>>,
    serializers: Vec<Arc<dyn Interceptor<SerializeFn<I, O>>>>,
    builders: Vec<Arc<dyn Interceptor<BuildFn<O>>>>,
    deserializers: Vec<Arc<dyn Interceptor<DeserializeFn<O>>>>,
    transport: Option<Arc<dyn Transport>>,
}

impl<I, O> Default for PipelineBuilder<I, O> {
    fn default() -> Self {
        Self {
            initializers: Vec::new(),
            serializers: Vec::new(),
            builders: Vec::new(),
            deserializers: Vec::new(),
            transport: None,
        }
    }
}

impl<I, O> PipelineBuilder<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an Initialize interceptor.
    #[must_use]
    pub fn initializer(mut self, interceptor: impl Interceptor<InitializeFn<I, O>> + 'static) -> Self {
        self.initializers.push(Arc::new(interceptor));
        self
    }

    /// Appends a shared Initialize interceptor.
    #[must_use]
    pub fn initializer_arc(mut self, interceptor: Arc<dyn Interceptor<InitializeFn<I, O>>>) -> Self {
        self.initializers.push(interceptor);
        self
    }

    /// Appends a Serialize interceptor.
    #[must_use]
    pub fn serializer(mut self, interceptor: impl Interceptor<SerializeFn<I, O>> + 'static) -> Self {
        self.serializers.push(Arc::new(interceptor));
        self
    }

    /// Appends a shared Serialize interceptor.
    #[must_use]
    pub fn serializer_arc(mut self, interceptor: Arc<dyn Interceptor<SerializeFn<I, O>>>) -> Self {
        self.serializers.push(interceptor);
        self
    }

    /// Appends a Build interceptor.
    #[must_use]
    pub fn builder(mut self, interceptor: impl Interceptor<BuildFn<O>> + 'static) -> Self {
        self.builders.push(Arc::new(interceptor));
        self
    }

    /// Appends a shared Build interceptor.
    #[must_use]
    pub fn builder_arc(mut self, interceptor: Arc<dyn Interceptor<BuildFn<O>>>) -> Self {
        self.builders.push(interceptor);
        self
    }

    /// Appends a Deserialize interceptor.
    #[must_use]
    pub fn deserializer(mut self, interceptor: impl Interceptor<DeserializeFn<O>> + 'static) -> Self {
        self.deserializers.push(Arc::new(interceptor));
        self
    }

    /// Appends a shared Deserialize interceptor.
    #[must_use]
    pub fn deserializer_arc(mut self, interceptor: Arc<dyn Interceptor<DeserializeFn<O>>>) -> Self {
        self.deserializers.push(interceptor);
        self
    }

    /// Sets the transport.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets a shared transport.
    #[must_use]
    pub fn transport_arc(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Composes every stage and binds the transport.
    pub fn build(self) -> Result<Pipeline<I, O>, BuildError> {
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;
        if self.serializers.is_empty() {
            return Err(BuildError::MissingSerializer);
        }

        Ok(Pipeline::assemble(
            &compose(self.initializers),
            &compose(self.serializers),
            &compose(self.builders),
            &compose(self.deserializers),
            transport,
        ))
    }
}
