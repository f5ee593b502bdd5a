//! # Shared defaults for task specifications.
//!
//! Provides [`Config`] centralized retry settings that many specifications can inherit
//! through [`TaskSpecBuilder::from_config`](crate::TaskSpecBuilder::from_config).
//!
//! ## Sentinel values
//! - `retries = 0` → a single attempt
//! - `retry_wait = 0s` → retry immediately
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use runvisor::{Config, JitterPolicy};
//!
//! let mut cfg = Config::default();
//! cfg.retries = 2;
//! cfg.retry_wait = Duration::from_secs(1);
//! cfg.jitter = JitterPolicy::Equal;
//!
//! assert_eq!(cfg.retry_policy().max_attempts(), 3);
//! ```

use std::time::Duration;

use crate::policies::{JitterPolicy, RetryPolicy};

/// Default retry configuration.
///
/// ## Field semantics
/// - `retries`: retries after the first attempt
/// - `retry_wait`: wait between attempts, before jitter
/// - `jitter`: randomization applied to every wait
///
/// All fields are public; they are typed, so no normalization is needed when a
/// specification inherits them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Default retry count.
    pub retries: u32,

    /// Default wait between attempts.
    pub retry_wait: Duration,

    /// Default jitter policy.
    pub jitter: JitterPolicy,
}

impl Config {
    /// Returns the retry policy described by this config.
    #[inline]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.retry_wait).with_jitter(self.jitter)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `retries = 0` (single attempt)
    /// - `retry_wait = 0s`
    /// - `jitter = JitterPolicy::None`
    fn default() -> Self {
        Self {
            retries: 0,
            retry_wait: Duration::ZERO,
            jitter: JitterPolicy::None,
        }
    }
}
