//! Stage function types and the terminal transport contract.
//!
//! A call runs through four stages, outermost first:
//!
//! ```text
//! Initialize -> Serialize -> Build -> Deserialize -> Transport
//! Initialize <- Serialize <- Build <- Deserialize <- Transport
//! ```
//!
//! Each stage function receives the call [`Context`] by value and returns an
//! [`Outcome`]. Interceptors wrap a stage function to produce another one of
//! the same type.

use crate::context::Context;
use crate::core::{Outcome, Request, WireRequest, WireResponse};
use crate::errors::BoxError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// The future every stage function returns.
pub type StageFuture<T> = BoxFuture<'static, Outcome<T>>;

/// Prepares the typed input: defaults, validation, call identity.
pub type InitializeFn<I, O> = Arc<dyn Fn(Context, I) -> StageFuture<Option<O>> + Send + Sync>;

/// Turns the typed input into a [`Request`].
pub type SerializeFn<I, O> =
    Arc<dyn Fn(Context, SerializeInput<I>) -> StageFuture<Option<O>> + Send + Sync>;

/// Decorates the request: headers, checksums, retries.
pub type BuildFn<O> = Arc<dyn Fn(Context, Request) -> StageFuture<Option<O>> + Send + Sync>;

/// Sends the wire request and decodes the response.
pub type DeserializeFn<O> =
    Arc<dyn Fn(Context, WireRequest) -> StageFuture<DeserializeOutput<O>> + Send + Sync>;

/// What the serialize stage receives.
#[derive(Debug)]
pub struct SerializeInput<I> {
    /// The typed input.
    pub input: I,
    /// The request built so far. Absent until a serializer creates it.
    pub request: Option<Request>,
}

impl<I> SerializeInput<I> {
    /// Wraps an input with no request yet.
    pub fn new(input: I) -> Self {
        Self {
            input,
            request: None,
        }
    }

    /// Attaches the request.
    #[must_use]
    pub fn with_request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }
}

/// What the deserialize stage returns.
///
/// Both fields may be set alongside an error: a failed call can still carry
/// the response that explains it.
#[derive(Debug)]
pub struct DeserializeOutput<O> {
    /// The decoded result.
    pub output: Option<O>,
    /// The raw response, when one arrived.
    pub response: Option<WireResponse>,
}

impl<O> Default for DeserializeOutput<O> {
    fn default() -> Self {
        Self {
            output: None,
            response: None,
        }
    }
}

impl<O> DeserializeOutput<O> {
    /// Creates an output holding only a response.
    #[must_use]
    pub fn from_response(response: WireResponse) -> Self {
        Self {
            output: None,
            response: Some(response),
        }
    }
}

/// Sends a wire request to a peer.
///
/// `Ok` means bytes were exchanged and a response came back, whatever its
/// status. Implementations should give up when the context finishes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request.
    async fn send(&self, ctx: &Context, request: WireRequest) -> Result<WireResponse, BoxError>;
}

/// Lifts an async closure into an [`InitializeFn`].
pub fn initialize_fn<I, O, F, Fut>(f: F) -> InitializeFn<I, O>
where
    I: 'static,
    O: 'static,
    F: Fn(Context, I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<Option<O>>> + Send + 'static,
{
    Arc::new(move |ctx: Context, input: I| -> StageFuture<Option<O>> {
        Box::pin(f(ctx, input))
    })
}

/// Lifts an async closure into a [`SerializeFn`].
pub fn serialize_fn<I, O, F, Fut>(f: F) -> SerializeFn<I, O>
where
    I: 'static,
    O: 'static,
    F: Fn(Context, SerializeInput<I>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<Option<O>>> + Send + 'static,
{
    Arc::new(move |ctx: Context, input: SerializeInput<I>| -> StageFuture<Option<O>> {
        Box::pin(f(ctx, input))
    })
}

/// Lifts an async closure into a [`BuildFn`].
pub fn build_fn<O, F, Fut>(f: F) -> BuildFn<O>
where
    O: 'static,
    F: Fn(Context, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<Option<O>>> + Send + 'static,
{
    Arc::new(move |ctx: Context, request: Request| -> StageFuture<Option<O>> {
        Box::pin(f(ctx, request))
    })
}

/// Lifts an async closure into a [`DeserializeFn`].
pub fn deserialize_fn<O, F, Fut>(f: F) -> DeserializeFn<O>
where
    O: 'static,
    F: Fn(Context, WireRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome<DeserializeOutput<O>>> + Send + 'static,
{
    Arc::new(move |ctx: Context, request: WireRequest| -> StageFuture<DeserializeOutput<O>> {
        Box::pin(f(ctx, request))
    })
}
