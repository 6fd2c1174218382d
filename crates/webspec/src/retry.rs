//! Retry-until-timeout engine.
//!
//! The single polling mechanism behind element lookup and assertions:
//! invoke an operation, return on success, swallow retryable failures and
//! poll again until the timeout elapses, then surface the last failure
//! wrapped as [`SpecError::Timeout`].

use crate::clock::{millis_between, Clock};
use crate::result::{SpecError, SpecResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default retry timeout (4 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 4000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Floor applied to the poll interval so a zero interval cannot spin
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total timeout duration
    pub timeout: Duration,
    /// Interval between attempts
    pub poll_interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl RetryConfig {
    /// Create a config with the given timeout and the default poll interval
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    /// Create a config from millisecond values
    #[must_use]
    pub const fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(poll_interval_ms),
        }
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout in whole milliseconds
    #[must_use]
    pub const fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    fn effective_interval(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }
}

/// Repeatedly invoke `operation` until it succeeds or the timeout elapses.
///
/// Non-retryable failures (see [`SpecError::is_retryable`]) are returned
/// immediately. The final sleep is clamped to the remaining budget so the
/// loop makes one last attempt at the deadline instead of oversleeping it.
///
/// # Errors
///
/// Returns the first non-retryable failure, or [`SpecError::Timeout`]
/// wrapping the last retryable failure once the timeout has elapsed.
pub fn retry<T, F>(clock: &dyn Clock, config: &RetryConfig, mut operation: F) -> SpecResult<T>
where
    F: FnMut() -> SpecResult<T>,
{
    let start = clock.now();
    let mut attempts = 0usize;

    loop {
        attempts += 1;

        let err = match operation() {
            Ok(value) => {
                if attempts > 1 {
                    tracing::debug!(attempts, "retry succeeded");
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        let elapsed = clock.now().saturating_sub(start);
        if elapsed >= config.timeout {
            let ms = millis_between(start, clock.now());
            tracing::warn!(attempts, ms, error = %err, "retry timed out");
            return Err(SpecError::Timeout {
                ms,
                attempts,
                last: Box::new(err),
            });
        }

        tracing::trace!(attempt = attempts, error = %err, "retrying");
        let remaining = config.timeout - elapsed;
        clock.sleep(config.effective_interval().min(remaining));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;
    use std::cell::Cell;

    mod config_tests {
        use super::*;

        #[test]
        fn test_default_config() {
            let config = RetryConfig::default();
            assert_eq!(config.timeout, Duration::from_millis(4000));
            assert_eq!(config.poll_interval, Duration::from_millis(50));
        }

        #[test]
        fn test_builders() {
            let config = RetryConfig::new(Duration::from_secs(1))
                .with_poll_interval(Duration::from_millis(20));
            assert_eq!(config.timeout_ms(), 1000);
            assert_eq!(config.poll_interval, Duration::from_millis(20));
        }

        #[test]
        fn test_zero_interval_is_floored() {
            let config = RetryConfig::from_millis(10, 0);
            assert_eq!(config.effective_interval(), MIN_POLL_INTERVAL);
        }
    }

    mod retry_tests {
        use super::*;

        #[test]
        fn test_immediate_success_makes_one_attempt() {
            let clock = ManualClock::new();
            let calls = Cell::new(0);
            let value = retry(&clock, &RetryConfig::default(), || {
                calls.set(calls.get() + 1);
                Ok::<_, SpecError>(7)
            })
            .unwrap();
            assert_eq!(value, 7);
            assert_eq!(calls.get(), 1);
            assert_eq!(clock.now(), Duration::ZERO);
        }

        #[test]
        fn test_succeeds_after_transient_failures() {
            let clock = ManualClock::new();
            let calls = Cell::new(0);
            let value = retry(&clock, &RetryConfig::from_millis(1000, 100), || {
                calls.set(calls.get() + 1);
                if calls.get() < 4 {
                    Err(SpecError::Detached {
                        selector: "#late".into(),
                    })
                } else {
                    Ok("attached")
                }
            })
            .unwrap();
            assert_eq!(value, "attached");
            assert_eq!(calls.get(), 4);
            assert_eq!(clock.now(), Duration::from_millis(300));
        }

        #[test]
        fn test_times_out_with_last_failure() {
            let clock = ManualClock::new();
            let err = retry(&clock, &RetryConfig::from_millis(200, 50), || {
                Err::<(), _>(SpecError::assertion("still false"))
            })
            .unwrap_err();

            match err {
                SpecError::Timeout { ms, attempts, last } => {
                    assert_eq!(ms, 200);
                    assert_eq!(attempts, 5);
                    assert!(matches!(*last, SpecError::Assertion { .. }));
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[test]
        fn test_non_retryable_error_returns_immediately() {
            let clock = ManualClock::new();
            let calls = Cell::new(0);
            let err = retry(&clock, &RetryConfig::default(), || {
                calls.set(calls.get() + 1);
                Err::<(), _>(SpecError::driver("page crashed"))
            })
            .unwrap_err();
            assert!(matches!(err, SpecError::Driver { .. }));
            assert_eq!(calls.get(), 1);
        }

        #[test]
        fn test_final_sleep_is_clamped_to_deadline() {
            let clock = ManualClock::new();
            let _ = retry(&clock, &RetryConfig::from_millis(120, 50), || {
                Err::<(), _>(SpecError::assertion("never"))
            });
            assert_eq!(clock.now(), Duration::from_millis(120));
        }
    }

    proptest! {
        /// A target that shows up before the deadline is always found.
        #[test]
        fn prop_found_before_timeout(timeout in 100u64..10_000, interval in 1u64..100, frac in 0.0f64..1.0) {
            prop_assume!(interval < timeout);
            let appears_at = (timeout as f64 * frac) as u64;
            let clock = ManualClock::new();
            let result = retry(&clock, &RetryConfig::from_millis(timeout, interval), || {
                if clock.now() >= Duration::from_millis(appears_at) {
                    Ok(())
                } else {
                    Err(SpecError::assertion("absent"))
                }
            });
            prop_assert!(result.is_ok());
            prop_assert!(clock.now() < Duration::from_millis(appears_at + interval));
        }

        /// A target that never shows up fails at the timeout, within one interval.
        #[test]
        fn prop_never_found_fails_near_timeout(timeout in 100u64..10_000, interval in 1u64..100) {
            prop_assume!(interval < timeout);
            let clock = ManualClock::new();
            let result = retry(&clock, &RetryConfig::from_millis(timeout, interval), || {
                Err::<(), _>(SpecError::assertion("absent"))
            });
            let elapsed = clock.now().as_millis() as u64;
            let timed_out = matches!(result, Err(SpecError::Timeout { .. }));
            prop_assert!(timed_out);
            prop_assert!(elapsed >= timeout);
            prop_assert!(elapsed <= timeout + interval);
        }
    }
}
