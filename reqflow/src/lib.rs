//! # Reqflow
//!
//! A composable request-execution pipeline for HTTP-like clients.
//!
//! Every call flows through four stages, each a stack of interceptors:
//!
//! - **Initialize**: call identity, defaults, validation
//! - **Serialize**: the typed input becomes a [`Request`](core::Request)
//! - **Build**: headers, checksums and retries decorate the request
//! - **Deserialize**: the wire response becomes the typed output
//!
//! A [`Transport`](pipeline::Transport) sits at the bottom and performs the
//! exchange. Metadata recorded along the way comes back with the outcome.
//!
//! ## Quick Start
//!
//! ```no_run
//! use http::Method;
//! use reqflow::prelude::*;
//! use reqflow::testing::{FixedRequestSerializer, ScriptedTransport, StatusDeserializer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = PipelineBuilder::<(), u16>::new()
//!     .initializer(WrapOperationErrorInitializer)
//!     .initializer(ServiceOperationInitializer::new("Store", "GetProduct"))
//!     .serializer(FixedRequestSerializer::new(Method::GET, "http://example.com/products/1"))
//!     .builder(RequestIdBuilder::new())
//!     .builder(RetryBuilder::default())
//!     .deserializer(WrapResponseErrorDeserializer)
//!     .deserializer(RequestIdDeserializer::new())
//!     .deserializer(StatusDeserializer)
//!     .transport(ScriptedTransport::new())
//!     .build()?;
//!
//! let status = pipeline.call(Context::background(), ()).await?;
//! assert_eq!(status, Some(200));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod context;
pub mod core;
pub mod errors;
pub mod observability;
pub mod pathx;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod retry;
pub mod testing;
pub mod transport;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{CancelCause, CancelHandle, Context};
    pub use crate::core::{Body, Key, Metadata, Outcome, Request, WireRequest, WireResponse};
    pub use crate::errors::{
        ApiError, BoxError, Error, ErrorFault, ErrorProbe, GenericApiError, OperationError,
        RequestSendError, ResponseError, RetryError,
    };
    pub use crate::observability::{init_tracing, LogFormat, TracingInitializer};
    pub use crate::pathx::Template;
    pub use crate::pipeline::{
        BuildFn, DeserializeFn, DeserializeOutput, InitializeFn, Interceptor, Pipeline,
        PipelineBuilder, SerializeFn, SerializeInput, StageFuture, Transport,
    };
    pub use crate::request::{
        ContentLengthBuilder, ContentMd5Builder, RequestIdBuilder, ServiceOperationInitializer,
        UserAgentBuilder, WrapOperationErrorInitializer,
    };
    pub use crate::response::{
        BodyCloseDeserializer, BodyDiscardDeserializer, DateDeserializer, RequestIdDeserializer,
        ResponseDeserializer, WrapRequestErrorDeserializer, WrapResponseErrorDeserializer,
    };
    pub use crate::retry::{BasicRetryer, ExponentialBackoff, RetryBuilder, RetryConfig};
    pub use crate::transport::FnTransport;
    #[cfg(feature = "reqwest")]
    pub use crate::transport::ReqwestTransport;
}
