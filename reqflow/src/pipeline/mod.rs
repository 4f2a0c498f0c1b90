//! Pipeline building and execution.
//!
//! This module provides:
//! - Stage function types and the transport contract
//! - Interceptor composition
//! - The pipeline builder
//! - The pipeline engine that joins the four stages

mod builder;
mod compose;
mod handler;
mod stages;

pub use builder::{BuildError, PipelineBuilder};
pub use compose::{compose, from_fn, FnInterceptor, Interceptor};
pub use handler::Pipeline;
pub use stages::{
    build_fn, deserialize_fn, initialize_fn, serialize_fn, BuildFn, DeserializeFn,
    DeserializeOutput, InitializeFn, SerializeFn, SerializeInput, StageFuture, Transport,
};
