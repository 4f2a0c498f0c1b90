//! Testing utilities for reqflow pipelines.
//!
//! This module provides:
//! - Mock transports that replay scripts, fail, or stall
//! - Fixture stages for assembling small pipelines

mod fixtures;
mod mocks;

pub use fixtures::{FixedRequestSerializer, StatusDeserializer};
pub use mocks::{FailingTransport, RecordedRequest, ScriptedTransport, SlowTransport};
