//! # Runner strategies and the run-handle contract.
//!
//! A [`Runner`] turns one invocation of a [`TaskSpec`](crate::TaskSpec) into a live
//! [`RunHandle`]. The runner is chosen when the specification is built and never changes.
//!
//! | Runner             | Substrate                     | `invoke` blocks? | `wait` suspends by     |
//! |--------------------|-------------------------------|------------------|------------------------|
//! | [`Sequential`]     | caller's thread               | **yes**          | (already finished)     |
//! | [`IsolatedWorker`] | forked OS process + pipe      | no               | the pipe reader thread |
//! | [`Cooperative`]    | tokio task                    | no               | awaiting the task      |
//!
//! ## State machine
//! ```text
//! Running ──► Finished   (outcome produced)
//!    └──────► Stopped    (stop(): worker → NoResult, cooperative → Failure(Canceled))
//! ```
//! `Finished` and `Stopped` are terminal.
//!
//! ## Retrieval
//! ```text
//! get_result(opts)
//!   ├─ !block_if_running && running ─► raise_on_failure ? Err(StillRunning) : Ok(Pending)
//!   └─ wait() then read outcome:
//!        Success(v) ─► Ok(Value(v))
//!        Failure(e) ─► raise_on_failure ? Err(Failed(e)) : Ok(Failure(e))
//!        none       ─► Ok(NoResult)
//! ```

mod cooperative;
mod sequential;
mod worker;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    channel::Outcome,
    error::{RunError, TaskError},
    events::{Event, EventKind},
    policies::RetryPolicy,
    subscribers::SubscriberSet,
};

pub use cooperative::{Cooperative, CooperativeRun};
pub use sequential::{Sequential, SequentialRun};
pub use worker::{IsolatedWorker, WorkerRun};

/// Everything a runner needs to start one invocation.
pub struct Launch<F, A> {
    /// Unique instance name (`{name}-{uuid}`).
    pub instance: Arc<str>,
    /// Shared task body.
    pub body: Arc<F>,
    /// Arguments; cloned for every attempt.
    pub args: A,
    /// Retry policy of the specification.
    pub retry: RetryPolicy,
    /// Lifecycle event sink.
    pub subscribers: SubscriberSet,
}

/// Execution strategy for invocations of a body `F` with arguments `A`.
pub trait Runner<F, A>: Send + Sync + 'static {
    /// Handle type produced per invocation.
    type Handle: RunHandle;

    /// Starts the invocation. Work begins immediately.
    fn launch(&self, launch: Launch<F, A>) -> Self::Handle;
}

/// Options for [`RunHandle::get_result`].
///
/// Defaults: `raise_on_failure = false`, `block_if_running = true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GetResult {
    /// Return faults as `Err` instead of [`Fetched::Failure`].
    pub raise_on_failure: bool,
    /// Wait for completion instead of reporting "still running".
    pub block_if_running: bool,
}

impl Default for GetResult {
    fn default() -> Self {
        Self {
            raise_on_failure: false,
            block_if_running: true,
        }
    }
}

impl GetResult {
    /// Returns options that surface faults as `Err`.
    pub fn raising(mut self) -> Self {
        self.raise_on_failure = true;
        self
    }

    /// Returns options that never wait.
    pub fn non_blocking(mut self) -> Self {
        self.block_if_running = false;
        self
    }
}

/// What [`RunHandle::get_result`] obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// The body's value.
    Value(T),
    /// The captured fault (only when not raising).
    Failure(TaskError),
    /// The run ended without an outcome (worker stopped or killed).
    NoResult,
    /// Still running and the caller asked not to wait (only when not raising).
    Pending,
}

impl<T> Fetched<T> {
    /// The value, if any.
    pub fn value(self) -> Option<T> {
        match self {
            Fetched::Value(v) => Some(v),
            _ => None,
        }
    }

    /// True for [`Fetched::NoResult`].
    pub fn is_no_result(&self) -> bool {
        matches!(self, Fetched::NoResult)
    }
}

/// Live, per-invocation handle.
///
/// `wait` and `get_result` are the only suspension points; `stop` and `is_running` never wait.
#[async_trait]
pub trait RunHandle: Send {
    /// Value produced by the body.
    type Output: Clone + Send + 'static;

    /// Unique instance name of this run.
    fn instance(&self) -> &str;

    /// Non-blocking poll of completion state.
    fn is_running(&mut self) -> bool;

    /// Suspends until the outcome is available; no-op if already finished.
    async fn wait(&mut self);

    /// Requests cancellation of in-flight work; idempotent, no-op if already finished.
    fn stop(&mut self);

    /// Obtains the outcome according to `opts`. Repeated calls return the same outcome.
    async fn get_result(&mut self, opts: GetResult) -> Result<Fetched<Self::Output>, RunError>;
}

/// Reports a non-blocking request against a running task.
pub(crate) fn still_running<T>(
    instance: &str,
    subs: &SubscriberSet,
    opts: GetResult,
) -> Result<Fetched<T>, RunError> {
    if opts.raise_on_failure {
        return Err(RunError::StillRunning {
            instance: instance.to_string(),
        });
    }
    subs.emit(Event::new(EventKind::StillRunning).with_task(instance));
    Ok(Fetched::Pending)
}

/// Maps a settled outcome to the caller's view.
pub(crate) fn resolve<T: Clone>(
    instance: &str,
    subs: &SubscriberSet,
    outcome: Option<&Outcome<T>>,
    opts: GetResult,
) -> Result<Fetched<T>, RunError> {
    match outcome {
        Some(Outcome::Success(v)) => Ok(Fetched::Value(v.clone())),
        Some(Outcome::Failure(e)) if opts.raise_on_failure => Err(RunError::Failed(e.clone())),
        Some(Outcome::Failure(e)) => Ok(Fetched::Failure(e.clone())),
        None => {
            subs.emit(Event::new(EventKind::NoResult).with_task(instance));
            Ok(Fetched::NoResult)
        }
    }
}
