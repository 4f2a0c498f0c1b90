//! Serializable retry configuration.

use super::backoff::{ExponentialBackoff, JitterStrategy};
use super::retryable::DEFAULT_RETRYABLE_STATUS_CODES;
use super::retryer::DEFAULT_MAX_ATTEMPTS;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised when loading retry configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be parsed.
    #[error("invalid retry config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid retry config: {0}")]
    Invalid(String),
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per call, including the first. 0 means unlimited.
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    pub initial_delay_ms: u64,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter strategy.
    pub jitter: JitterStrategy,
    /// HTTP status codes that trigger a retry.
    pub retryable_status_codes: Vec<u16>,
    /// Application error codes that trigger a retry.
    pub retryable_error_codes: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: 1000,
            multiplier: 2.0,
            max_delay_ms: 20_000,
            jitter: JitterStrategy::Proportional(50),
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.to_vec(),
            retryable_error_codes: Vec::new(),
        }
    }
}

impl RetryConfig {
    /// Creates the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values describe a usable policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "multiplier must be at least 1.0, got {}",
                self.multiplier
            )));
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "initial delay {}ms exceeds max delay {}ms",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }
        if let JitterStrategy::Proportional(percent) = self.jitter {
            if percent > 100 {
                return Err(ConfigError::Invalid(format!(
                    "jitter percent must be at most 100, got {percent}"
                )));
            }
        }
        Ok(())
    }

    /// Returns the backoff these settings describe.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial: Duration::from_millis(self.initial_delay_ms),
            multiplier: self.multiplier,
            max: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        }
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn with_initial_delay_ms(mut self, delay: u64) -> Self {
        self.initial_delay_ms = delay;
        self
    }

    /// Sets the multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter = strategy;
        self
    }

    /// Sets the retryable status codes.
    #[must_use]
    pub fn with_retryable_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.retryable_status_codes = codes;
        self
    }

    /// Sets the retryable error codes.
    #[must_use]
    pub fn with_retryable_error_codes(mut self, codes: Vec<String>) -> Self {
        self.retryable_error_codes = codes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_fills_defaults() {
        let config = RetryConfig::from_json(r#"{"max_attempts": 5, "jitter": "none"}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.jitter, JitterStrategy::None);
        assert_eq!(config.initial_delay_ms, 1000);
        assert_eq!(config.retryable_status_codes, vec![500, 502, 503, 504]);
    }

    #[test]
    fn test_from_json_proportional_jitter() {
        let config = RetryConfig::from_json(r#"{"jitter": {"proportional": 20}}"#).unwrap();
        assert_eq!(config.jitter, JitterStrategy::Proportional(20));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = RetryConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(RetryConfig::default().validate().is_ok());
        assert!(RetryConfig::default().with_multiplier(0.5).validate().is_err());
        assert!(RetryConfig::default()
            .with_initial_delay_ms(30_000)
            .validate()
            .is_err());
        assert!(RetryConfig::default()
            .with_jitter(JitterStrategy::Proportional(150))
            .validate()
            .is_err());
    }

    #[test]
    fn test_backoff_from_config() {
        let backoff = RetryConfig::default().with_initial_delay_ms(250).backoff();
        assert_eq!(backoff.initial, Duration::from_millis(250));
        assert_eq!(backoff.max, Duration::from_secs(20));
    }
}
