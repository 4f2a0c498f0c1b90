//! Per-call context and cancellation.
//!
//! This module provides:
//! - The immutable, chainable [`Context`] passed to every stage
//! - Cancellation handles and causes
//! - The cooperative cancellation token underneath both

mod call;
mod token;

pub use call::{CancelCause, CancelHandle, Context};
pub use token::{CancelCallback, CancellationToken};
