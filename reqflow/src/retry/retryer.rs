//! Retry policies.

use super::backoff::{Delayer, ExponentialBackoff};
use super::config::{ConfigError, RetryConfig};
use super::retryable::{
    default_checker, ConnectionErrorChecker, ErrorCodeChecker, HttpStatusCodeChecker, Retryable,
    RetryableChecker, RetryableCheckers, RetryableErrorChecker,
};
use crate::errors::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Attempts this crate makes per call unless told otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Decides whether and when a failed attempt is repeated.
pub trait Retryer: Send + Sync {
    /// Attempt budget per call, counting the first attempt. 0 means unlimited.
    fn max_attempts(&self) -> u32;

    /// Delay before attempt number `attempt`.
    fn delay(&self, attempt: u32) -> Duration;

    /// Classifies the error of a failed attempt.
    fn check(&self, err: &Error) -> Retryable;
}

/// A retryer assembled from an attempt budget, a delayer and a checker.
#[derive(Clone)]
pub struct BasicRetryer {
    max_attempts: u32,
    delayer: Arc<dyn Delayer>,
    checker: Arc<dyn RetryableChecker>,
}

impl Default for BasicRetryer {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delayer: Arc::new(ExponentialBackoff::default()),
            checker: Arc::new(default_checker()),
        }
    }
}

impl BasicRetryer {
    /// Creates the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut checker = RetryableCheckers::new()
            .with(RetryableErrorChecker)
            .with(ConnectionErrorChecker)
            .with(HttpStatusCodeChecker::new(config.retryable_status_codes.iter().copied()));
        if !config.retryable_error_codes.is_empty() {
            checker = checker.with(ErrorCodeChecker::new(config.retryable_error_codes.iter().cloned()));
        }

        Ok(Self {
            max_attempts: config.max_attempts,
            delayer: Arc::new(config.backoff()),
            checker: Arc::new(checker),
        })
    }

    /// Sets the attempt budget. 0 means unlimited.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delayer.
    #[must_use]
    pub fn with_delayer(mut self, delayer: impl Delayer + 'static) -> Self {
        self.delayer = Arc::new(delayer);
        self
    }

    /// Sets the checker.
    #[must_use]
    pub fn with_checker(mut self, checker: impl RetryableChecker + 'static) -> Self {
        self.checker = Arc::new(checker);
        self
    }
}

impl Retryer for BasicRetryer {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.delayer.delay(attempt)
    }

    fn check(&self, err: &Error) -> Retryable {
        self.checker.check(err)
    }
}

impl fmt::Debug for BasicRetryer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicRetryer")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WireResponse;
    use crate::errors::{GenericApiError, ResponseError};
    use crate::retry::NoDelay;
    use http::StatusCode;

    #[test]
    fn test_default_policy() {
        let retryer = BasicRetryer::default();
        assert_eq!(retryer.max_attempts(), 3);
        assert!(retryer.delay(2) <= Duration::from_secs(1));
        assert_eq!(retryer.check(&Error::other("plain")), Retryable::Unknown);
    }

    #[test]
    fn test_builder_overrides() {
        let retryer = BasicRetryer::new()
            .with_max_attempts(5)
            .with_delayer(NoDelay)
            .with_checker(|_: &Error| Retryable::Yes);

        assert_eq!(retryer.max_attempts(), 5);
        assert_eq!(retryer.delay(4), Duration::ZERO);
        assert_eq!(retryer.check(&Error::other("x")), Retryable::Yes);
    }

    #[test]
    fn test_from_config_uses_configured_codes() {
        let config = RetryConfig::default()
            .with_max_attempts(0)
            .with_retryable_status_codes(vec![429])
            .with_retryable_error_codes(vec!["Throttling".to_string()]);
        let retryer = BasicRetryer::from_config(&config).unwrap();

        let too_many = Error::from(ResponseError::new(
            WireResponse::new(StatusCode::TOO_MANY_REQUESTS),
            Error::other("slow down"),
        ));
        let unavailable = Error::from(ResponseError::new(
            WireResponse::new(StatusCode::SERVICE_UNAVAILABLE),
            Error::other("down"),
        ));
        let throttled = Error::from(GenericApiError::new("Throttling", "slow down"));

        assert_eq!(retryer.max_attempts(), 0);
        assert_eq!(retryer.check(&too_many), Retryable::Yes);
        assert_eq!(retryer.check(&unavailable), Retryable::Unknown);
        assert_eq!(retryer.check(&throttled), Retryable::Yes);
    }
}
