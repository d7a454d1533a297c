//! Bounded retry for flaky single-shot sensors.
//!
//! The DHT11 misses its timing window often enough that one failed read
//! says little. [`RetryingEnvironment`] repeats the read a fixed number of
//! times with a fixed pause and reports the last failure.

use std::thread;
use std::time::Duration;

use pulse_vitals::EnvironmentReading;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::HardwareError;
use crate::port::EnvironmentSensor;

/// How many times to try, and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first. Must be at least 1.
    pub max_attempts: u32,
    /// Pause after each failed attempt except the last (milliseconds).
    pub delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Run `op` until it succeeds or attempts run out.
    ///
    /// `op` receives the 1-based attempt number. The error of the final
    /// attempt is returned.
    pub fn run<T, F>(&self, what: &str, mut op: F) -> Result<T, HardwareError>
    where
        F: FnMut(u32) -> Result<T, HardwareError>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(what, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if attempt < attempts => {
                    warn!(what, attempt, max_attempts = attempts, error = %e, "attempt failed, retrying");
                    thread::sleep(self.delay());
                    attempt += 1;
                }
                Err(e) => {
                    warn!(what, attempts, error = %e, "all attempts failed");
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    /// 5 attempts, 1 s apart.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}

/// Environment sensor decorator applying a [`RetryPolicy`].
pub struct RetryingEnvironment<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: EnvironmentSensor> RetryingEnvironment<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: EnvironmentSensor> EnvironmentSensor for RetryingEnvironment<S> {
    fn read_environment(&mut self) -> Result<EnvironmentReading, HardwareError> {
        let inner = &mut self.inner;
        self.policy.run("environment read", |_| inner.read_environment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a scripted sequence of outcomes.
    struct Scripted {
        outcomes: VecDeque<Result<EnvironmentReading, HardwareError>>,
        calls: u32,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<EnvironmentReading, HardwareError>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                calls: 0,
            }
        }
    }

    impl EnvironmentSensor for Scripted {
        fn read_environment(&mut self) -> Result<EnvironmentReading, HardwareError> {
            self.calls += 1;
            self.outcomes
                .pop_front()
                .unwrap_or(Err(HardwareError::NoReading { device: "script" }))
        }
    }

    fn reading() -> EnvironmentReading {
        EnvironmentReading {
            temperature: 36.8,
            humidity: 40.0,
        }
    }

    fn null() -> Result<EnvironmentReading, HardwareError> {
        Err(HardwareError::NoReading { device: "DHT11" })
    }

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[test]
    fn default_policy() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.delay(), Duration::from_secs(1));
    }

    #[test]
    fn succeeds_on_third_attempt() {
        let mut env = RetryingEnvironment::new(Scripted::new(vec![null(), null(), Ok(reading())]), fast(5));
        assert_eq!(env.read_environment().unwrap(), reading());
        assert_eq!(env.into_inner().calls, 3);
    }

    #[test]
    fn exhausts_attempts_and_keeps_last_error() {
        let mut env = RetryingEnvironment::new(
            Scripted::new(vec![
                Err(HardwareError::Timeout { what: "response" }),
                null(),
            ]),
            fast(2),
        );
        let err = env.read_environment().unwrap_err();
        assert!(err.is_null_reading());
        assert_eq!(env.into_inner().calls, 2);
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let result: Result<(), _> = fast(0).run("noop", |_| {
            calls += 1;
            Err(HardwareError::NoReading { device: "x" })
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn attempt_numbers_are_one_based() {
        let mut seen = Vec::new();
        let _ = fast(3).run("count", |n| {
            seen.push(n);
            Err::<(), _>(HardwareError::NoReading { device: "x" })
        });
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
