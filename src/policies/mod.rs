//! Retry policies.
//!
//! This module groups the knobs that control **whether** a failed attempt is tried again
//! and **how long** to wait between attempts.
//!
//! ## Contents
//! - [`RetryPolicy`] retry count, wait and jitter; normalization of raw inputs
//! - [`RetryState`]  per-invocation attempt bookkeeping ([`Verdict`] after each failure)
//! - [`JitterPolicy`] randomization of the wait
//!
//! ## Quick wiring
//! ```text
//! TaskSpec { retry: RetryPolicy, .. }
//!      └─► core::retry loop uses:
//!           - policy.start() for a fresh RetryState per invocation
//!           - state.fail(err) to decide Retry{delay} / GiveUp(err)
//! ```
//!
//! ## Defaults
//! - `retries = 0`, `wait = 0s`, `JitterPolicy::None`.

mod jitter;
mod retry;

pub use jitter::JitterPolicy;
pub use retry::{Adjustment, MAX_RETRIES, RetryPolicy, RetryState, Verdict};
