//! # Bounded retry policy.
//!
//! [`RetryPolicy`] says how many times a failing body is tried again and how long to
//! wait in between. [`RetryState`] is the per-invocation bookkeeping driven by the
//! retry loop in `core`.
//!
//! ## Normalization
//! Raw numeric inputs go through [`RetryPolicy::normalize`] exactly once, when the
//! specification is built:
//! ```text
//! retries  < 0          → 0            (Adjustment::NegativeRetries)
//! retries  fractional   → round()      (Adjustment::FractionalRetries)
//! wait     < 0          → 0s           (Adjustment::NegativeWait)
//! NaN / ±inf            → ConfigError
//! ```
//!
//! ## Attempt flow
//! ```text
//! attempt 1 ─► Err(Fail) ─► Verdict::Retry{delay} ─► sleep ─► attempt 2 ─► ...
//!                  │
//!                  └─► attempts exhausted or not retryable ─► Verdict::GiveUp(err)
//! ```

use std::fmt;
use std::time::Duration;

use crate::error::{ConfigError, TaskError};
use crate::policies::jitter::JitterPolicy;

/// Largest accepted retry count.
pub const MAX_RETRIES: u32 = u32::MAX - 1;

/// Retry configuration of a task specification.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use runvisor::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(200));
/// assert_eq!(policy.max_attempts(), 4);
/// assert_eq!(policy.delay(), Duration::from_millis(200));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    retries: u32,
    wait: Duration,
    jitter: JitterPolicy,
}

/// An input that [`RetryPolicy::normalize`] had to change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjustment {
    /// Negative retry count clamped to zero.
    NegativeRetries { given: f64 },
    /// Fractional retry count rounded to the nearest integer.
    FractionalRetries { given: f64, rounded: u32 },
    /// Negative retry wait clamped to zero.
    NegativeWait { given: f64 },
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::NegativeRetries { given } => {
                write!(f, "retries={given} is negative; using 0")
            }
            Adjustment::FractionalRetries { given, rounded } => {
                write!(f, "retries={given} is not an integer; using {rounded}")
            }
            Adjustment::NegativeWait { given } => {
                write!(f, "retry wait={given}s is negative; using 0s")
            }
        }
    }
}

impl RetryPolicy {
    /// Creates a policy from already valid values.
    pub fn new(retries: u32, wait: Duration) -> Self {
        Self {
            retries: retries.min(MAX_RETRIES),
            wait,
            jitter: JitterPolicy::None,
        }
    }

    /// Normalizes raw inputs, reporting every change that was made.
    ///
    /// Only non-finite or out-of-range values are rejected.
    pub fn normalize(
        retries: f64,
        wait_secs: f64,
    ) -> Result<(Self, Vec<Adjustment>), ConfigError> {
        if !retries.is_finite() {
            return Err(ConfigError::NonFiniteRetries { given: retries });
        }
        if !wait_secs.is_finite() {
            return Err(ConfigError::NonFiniteRetryWait { given: wait_secs });
        }

        let mut adjustments = Vec::new();

        let count = if retries < 0.0 {
            adjustments.push(Adjustment::NegativeRetries { given: retries });
            0.0
        } else {
            retries.round()
        };
        if count > f64::from(MAX_RETRIES) {
            return Err(ConfigError::RetriesOutOfRange {
                given: retries,
                max: MAX_RETRIES,
            });
        }
        let count = count as u32;
        if retries >= 0.0 && retries.fract() != 0.0 {
            adjustments.push(Adjustment::FractionalRetries {
                given: retries,
                rounded: count,
            });
        }

        let wait = if wait_secs < 0.0 {
            adjustments.push(Adjustment::NegativeWait { given: wait_secs });
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(wait_secs)
                .map_err(|_| ConfigError::RetryWaitOutOfRange { given: wait_secs })?
        };

        Ok((Self::new(count, wait), adjustments))
    }

    /// Returns a new policy with the given jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Number of retries after the first attempt.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Configured wait between attempts (before jitter).
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Jitter applied to the wait.
    pub fn jitter(&self) -> JitterPolicy {
        self.jitter
    }

    /// Total attempts, `retries + 1`.
    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Wait before the next attempt, with jitter applied.
    pub fn delay(&self) -> Duration {
        self.jitter.apply(self.wait)
    }

    /// Starts the bookkeeping for one invocation.
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempt: 0,
            last: None,
        }
    }
}

/// What the retry loop does after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Sleep for `delay`, then run the next attempt.
    Retry { delay: Duration },
    /// Stop; this fault is the final outcome.
    GiveUp(TaskError),
}

/// Transient per-invocation retry state: attempts used and last captured failure.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
    last: Option<TaskError>,
}

impl RetryState {
    /// Marks the start of the next attempt and returns its 1-based number.
    pub fn begin(&mut self) -> u32 {
        self.attempt = self.attempt.saturating_add(1);
        self.attempt
    }

    /// Current attempt number (0 before the first `begin`).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Total attempts allowed.
    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts()
    }

    /// Attempts left after the current one.
    pub fn remaining(&self) -> u32 {
        self.policy.max_attempts().saturating_sub(self.attempt)
    }

    /// Last captured failure, if any.
    pub fn last_failure(&self) -> Option<&TaskError> {
        self.last.as_ref()
    }

    /// Records a failed attempt and decides whether to try again.
    ///
    /// Non-retryable faults end the loop regardless of the attempts left.
    pub fn fail(&mut self, err: TaskError) -> Verdict {
        self.last = Some(err.clone());
        if err.is_retryable() && self.remaining() > 0 {
            Verdict::Retry {
                delay: self.policy.delay(),
            }
        } else {
            Verdict::GiveUp(err)
        }
    }
}
