//! Delays between attempts.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Computes the delay before an attempt.
pub trait Delayer: Send + Sync {
    /// Returns how long to wait before attempt number `attempt`.
    fn delay(&self, attempt: u32) -> Duration;
}

impl<F> Delayer for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

/// Jitter strategy to prevent thundering herd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter
    None,
    /// Random from 0 to delay
    #[default]
    Full,
    /// Half fixed, half random
    Equal,
    /// Subtract a random share of up to this many percent
    Proportional(u8),
}

impl JitterStrategy {
    /// Applies the jitter to a delay in milliseconds.
    #[must_use]
    pub fn apply(self, delay_ms: u64) -> u64 {
        if delay_ms == 0 {
            return 0;
        }
        let mut rng = rand::thread_rng();
        match self {
            Self::None => delay_ms,
            Self::Full => rng.gen_range(0..=delay_ms),
            Self::Equal => {
                let half = delay_ms / 2;
                if half == 0 {
                    delay_ms
                } else {
                    half + rng.gen_range(0..=half)
                }
            }
            Self::Proportional(percent) => {
                let spread = delay_ms.saturating_mul(u64::from(percent.min(100))) / 100;
                if spread == 0 {
                    delay_ms
                } else {
                    delay_ms - rng.gen_range(0..=spread)
                }
            }
        }
    }
}

/// Exponential backoff with a ceiling.
///
/// The delay before attempt `n` is `initial * multiplier^(n - 2)`, capped at
/// `max`, then jittered. Attempt 2 is the first retry and waits `initial`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    /// Delay before the first retry.
    pub initial: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Upper bound before jitter.
    pub max: Duration,
    /// Randomization applied to each delay.
    pub jitter: JitterStrategy,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            multiplier: 2.0,
            max: Duration::from_secs(20),
            jitter: JitterStrategy::Proportional(50),
        }
    }
}

impl ExponentialBackoff {
    /// Returns the delay before jitter.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(2)).unwrap_or(i32::MAX);
        let secs = self.initial.as_secs_f64() * self.multiplier.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).map_or(self.max, |delay| delay.min(self.max))
    }
}

impl Delayer for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay(attempt).as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.jitter.apply(base_ms))
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delayer for NoDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady(initial_ms: u64, max_ms: u64) -> ExponentialBackoff {
        ExponentialBackoff {
            initial: Duration::from_millis(initial_ms),
            multiplier: 2.0,
            max: Duration::from_millis(max_ms),
            jitter: JitterStrategy::None,
        }
    }

    #[test]
    fn test_exponential_growth_and_cap() {
        let backoff = steady(100, 1000);
        assert_eq!(backoff.delay(2), Duration::from_millis(100));
        assert_eq!(backoff.delay(3), Duration::from_millis(200));
        assert_eq!(backoff.delay(4), Duration::from_millis(400));
        assert_eq!(backoff.delay(6), Duration::from_millis(1000));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn test_proportional_jitter_bounds() {
        let backoff = ExponentialBackoff {
            jitter: JitterStrategy::Proportional(50),
            ..steady(1000, 20_000)
        };
        for _ in 0..100 {
            let d = backoff.delay(3);
            assert!(d >= Duration::from_millis(1000) && d <= Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_full_and_equal_jitter_bounds() {
        for _ in 0..100 {
            assert!(JitterStrategy::Full.apply(100) <= 100);
            let equal = JitterStrategy::Equal.apply(100);
            assert!((50..=100).contains(&equal));
        }
        assert_eq!(JitterStrategy::Full.apply(0), 0);
    }

    #[test]
    fn test_base_delay_odd_multipliers() {
        let fractional = ExponentialBackoff {
            multiplier: 1.5,
            ..steady(100, 1000)
        };
        assert_eq!(fractional.base_delay(3), Duration::from_millis(150));

        let runaway = ExponentialBackoff {
            multiplier: f64::INFINITY,
            ..steady(100, 1000)
        };
        assert_eq!(runaway.base_delay(3), Duration::from_millis(1000));

        let broken = ExponentialBackoff {
            multiplier: f64::NAN,
            ..steady(100, 1000)
        };
        assert_eq!(broken.base_delay(3), Duration::ZERO);
        assert_eq!(steady(0, 1000).base_delay(5), Duration::ZERO);
    }

    #[test]
    fn test_default_backoff() {
        let backoff = ExponentialBackoff::default();
        assert_eq!(backoff.base_delay(2), Duration::from_secs(1));
        assert_eq!(backoff.base_delay(10), Duration::from_secs(20));
        assert!(backoff.delay(2) <= Duration::from_secs(1));
    }

    #[test]
    fn test_closure_delayer() {
        let constant = |_: u32| Duration::from_millis(5);
        assert_eq!(constant.delay(7), Duration::from_millis(5));
        assert_eq!(NoDelay.delay(3), Duration::ZERO);
    }
}
