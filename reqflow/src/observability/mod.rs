//! Logging setup and per-call events.

mod subscriber;
mod wide_event;

pub use subscriber::{init_tracing, LogFormat, DEFAULT_FILTER};
pub use wide_event::TracingInitializer;
pub use tracing_subscriber::util::TryInitError;
