//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! TaskSpec / retry loop / RunHandle ── emit(Event) ──► SubscriberSet
//!                                                         │
//!                                                    ┌────┴────┬─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter   Custom     ...
//!                                                (tracing)
//! ```
//!
//! The set is injected into each [`TaskSpec`](crate::TaskSpec); an empty set disables
//! logging without changing behavior.

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
