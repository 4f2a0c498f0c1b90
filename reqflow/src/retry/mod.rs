//! Retry engine.
//!
//! This module provides:
//! - Retryability classification rules and their default chain
//! - Backoff delayers with jitter
//! - The [`Retryer`] policy trait and [`BasicRetryer`]
//! - Serializable [`RetryConfig`]
//! - [`RetryBuilder`], the Build-stage interceptor that drives retries

mod backoff;
mod builder;
mod config;
mod retryable;
mod retryer;

pub use backoff::{Delayer, ExponentialBackoff, JitterStrategy, NoDelay};
pub use builder::RetryBuilder;
pub use config::{ConfigError, RetryConfig};
pub use retryable::{
    default_checker, ConnectionErrorChecker, ErrorCodeChecker, HttpStatusCodeChecker, Retryable,
    RetryableChecker, RetryableCheckers, RetryableErrorChecker, DEFAULT_RETRYABLE_STATUS_CODES,
};
pub use retryer::{BasicRetryer, Retryer, DEFAULT_MAX_ATTEMPTS};
