//! # Jitter policy for retry waits.
//!
//! [`JitterPolicy`] adds randomness to the retry wait so that many invocations of the
//! same specification that fail together do not retry in lockstep.
//!
//! - [`JitterPolicy::None`]: no randomization, the configured wait exactly
//! - [`JitterPolicy::Full`]: random delay in [0, wait]
//! - [`JitterPolicy::Equal`]: delay = wait/2 + random[0, wait/2]

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of retry waits.
///
/// ## Trade-offs
/// - **None**: Predictable, but sibling invocations retry together
/// - **Full**: Maximum spreading, can shorten the wait to zero
/// - **Equal**: Keeps at least half of the configured wait
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// No jitter: use the exact retry wait (default).
    #[default]
    None,

    /// Full jitter: random delay in [0, wait].
    Full,

    /// Equal jitter: delay = wait/2 + random[0, wait/2].
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given wait.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => full_jitter(delay),
            JitterPolicy::Equal => equal_jitter(delay),
        }
    }
}

/// Full jitter: random[0, delay]
fn full_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=ms))
}

/// Equal jitter: delay/2 + random[0, delay/2]
fn equal_jitter(delay: Duration) -> Duration {
    let ms = delay.as_millis() as u64;
    if ms == 0 {
        return Duration::ZERO;
    }
    let half = ms / 2;
    let jitter = if half == 0 {
        0
    } else {
        rand::rng().random_range(0..=half)
    };
    Duration::from_millis(half + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_identity() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.apply(d), d);
    }

    #[test]
    fn test_full_jitter_bounds() {
        for _ in 0..50 {
            assert!(JitterPolicy::Full.apply(Duration::from_millis(1000)) <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_equal_jitter_bounds() {
        for _ in 0..50 {
            let delay = JitterPolicy::Equal.apply(Duration::from_millis(1000));
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn test_zero_wait_stays_zero() {
        assert_eq!(JitterPolicy::Full.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Equal.apply(Duration::ZERO), Duration::ZERO);
    }
}
