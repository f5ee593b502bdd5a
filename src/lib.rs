//! # runvisor
//!
//! **Runvisor** lets you declare a unit of work once and run many independent invocations of
//! it under a chosen execution strategy, with automatic retry and a uniform handle for the
//! outcome.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   TaskSpecBuilder ── build(body) ──► TaskSpec { name, body, RetryPolicy, Runner, SubscriberSet }
//!                                          │
//!                          invoke(args) ───┤ (one call = one independent run)
//!            ┌─────────────────────────────┼─────────────────────────────┐
//!            ▼                             ▼                             ▼
//!     ┌──────────────┐             ┌───────────────┐             ┌───────────────┐
//!     │  Sequential  │             │ IsolatedWorker│             │  Cooperative  │
//!     │caller thread │             │ forked process│             │  tokio task   │
//!     └──────┬───────┘             └───────┬───────┘             └───────┬───────┘
//!            │ retry loop                  │ retry loop                  │ retry loop
//!            ▼                             ▼                             ▼
//!      Slot<Outcome>            pipe (JSON events + Outcome)     JoinHandle<Outcome>
//!            │                             │                             │
//!            └─────────────► RunHandle: is_running / wait / stop / get_result
//!
//!   every stage ── emit(Event) ──► SubscriberSet ──► LogWriter (tracing) / custom
//! ```
//!
//! ### Invocation lifecycle
//! ```text
//! invoke ─► TaskStarting
//! loop attempt in 1..=retries+1 {
//!   ├─ Ok(v)          ─► TaskFinished ─► Outcome::Success(v)
//!   └─ Err(e)         ─► AttemptFailed
//!        ├─ Fail and attempts left ─► RetryScheduled ─► wait ─► next attempt
//!        └─ otherwise              ─► TaskFailed     ─► Outcome::Failure(e)
//! }
//! stop() before completion:
//!   - IsolatedWorker: process killed, no outcome  ─► Fetched::NoResult
//!   - Cooperative:    task cancelled              ─► Fetched::Failure(TaskError::Canceled)
//!   - Sequential:     no-op (already finished)
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Tasks**         | Define a body once, invoke it many times.                       | [`TaskSpec`], [`TaskSpecBuilder`]           |
//! | **Runners**       | Synchronous, process-isolated or cooperative execution.         | [`Runner`], [`Sequential`], [`IsolatedWorker`], [`Cooperative`] |
//! | **Handles**       | Poll, wait, stop and fetch the outcome of one run.              | [`RunHandle`], [`GetResult`], [`Fetched`]   |
//! | **Policies**      | Retry count, wait and jitter.                                   | [`RetryPolicy`], [`JitterPolicy`]           |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom sinks).    | [`Subscribe`], [`SubscriberSet`], [`LogWriter`] |
//! | **Errors**        | Typed faults, retrieval errors and configuration errors.        | [`TaskError`], [`RunError`], [`ConfigError`] |
//! | **Configuration** | Shared retry defaults.                                          | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use runvisor::{Cooperative, Fetched, GetResult, RunHandle, TaskError, TaskSpec};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let spec = TaskSpec::builder()
//!         .name("nap")
//!         .retries(1)
//!         .runner(Cooperative::new())
//!         .build(|ms: u64| async move {
//!             tokio::time::sleep(Duration::from_millis(ms)).await;
//!             Ok::<_, TaskError>(ms)
//!         })?;
//!
//!     let mut short = spec.invoke(10);
//!     let mut long = spec.invoke(20);
//!
//!     assert_eq!(short.get_result(GetResult::default()).await?, Fetched::Value(10));
//!     assert_eq!(long.get_result(GetResult::default().raising()).await?, Fetched::Value(20));
//!     Ok(())
//! }
//! ```

mod channel;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod runners;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use channel::Outcome;
pub use config::Config;
pub use error::{ConfigError, RunError, TaskError};
pub use events::{Event, EventKind};
pub use policies::{Adjustment, JitterPolicy, MAX_RETRIES, RetryPolicy, RetryState, Verdict};
pub use runners::{
    Cooperative, CooperativeRun, Fetched, GetResult, IsolatedWorker, Launch, RunHandle, Runner,
    Sequential, SequentialRun, WorkerRun,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{TaskSpec, TaskSpecBuilder};
