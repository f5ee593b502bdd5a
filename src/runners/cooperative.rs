//! # Cooperative-task runner.
//!
//! Schedules the retry-wrapped async body as a tokio task. Invocations overlap on the
//! scheduler; `wait` and `get_result` yield to it until the task completes.
//!
//! ## Cancellation
//! ```text
//! stop() ─► token.cancel()
//!             └─ select! { run_async(..) , token.cancelled() } ─► Failure(Canceled)
//! ```
//! The body is dropped at its next suspension point. Retry sleeps are suspension points too,
//! so a stop between attempts is honored without running another attempt.
//!
//! ## Rules
//! - A panic inside the body is captured as `Failure(TaskError::Fatal)`.
//! - `wait` is cancel-safe: the join handle is kept until it resolves.
//! - Dropping the handle cancels the task.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    channel::{Outcome, Slot},
    core::{panic_message, retry},
    error::{RunError, TaskError},
    events::{Event, EventKind},
    subscribers::SubscriberSet,
};

use super::{Fetched, GetResult, Launch, RunHandle, Runner, resolve, still_running};

/// Runs each invocation as a task on a tokio runtime.
///
/// Without an explicit handle, [`launch`](Runner::launch) uses the ambient runtime and must be
/// called from within one.
#[derive(Clone, Debug, Default)]
pub struct Cooperative {
    handle: Option<Handle>,
}

impl Cooperative {
    /// Schedules onto the ambient runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules onto `handle`'s runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

/// Handle of a cooperative run.
#[derive(Debug)]
pub struct CooperativeRun<T> {
    instance: Arc<str>,
    subs: SubscriberSet,
    token: CancellationToken,
    /// Task handle until it has been joined.
    join: Option<JoinHandle<Outcome<T>>>,
    slot: Slot<T>,
}

impl<F, Fut, A, T> Runner<F, A> for Cooperative
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    A: Clone + Send + 'static,
    T: Clone + Send + 'static,
{
    type Handle = CooperativeRun<T>;

    fn launch(&self, launch: Launch<F, A>) -> CooperativeRun<T> {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let Launch {
            instance,
            body,
            args,
            retry: policy,
            subscribers,
        } = launch;

        let work = retry::run_async(body, args, policy, instance.clone(), subscribers.clone());
        let task = async move {
            tokio::select! {
                out = work => out,
                _ = cancelled.cancelled() => Outcome::Failure(TaskError::Canceled),
            }
        };

        let join = match &self.handle {
            Some(handle) => handle.spawn(task),
            None => tokio::spawn(task),
        };

        CooperativeRun {
            instance,
            subs: subscribers,
            token,
            join: Some(join),
            slot: Slot::empty(),
        }
    }
}

/// Maps an abnormal task exit to a fault.
fn join_failure(err: JoinError) -> TaskError {
    if err.is_cancelled() {
        return TaskError::Canceled;
    }
    match err.try_into_panic() {
        Ok(payload) => TaskError::fatal(format!("task panicked: {}", panic_message(payload.as_ref()))),
        Err(err) => TaskError::fatal(err.to_string()),
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> RunHandle for CooperativeRun<T> {
    type Output = T;

    fn instance(&self) -> &str {
        &self.instance
    }

    fn is_running(&mut self) -> bool {
        self.join.as_ref().is_some_and(|join| !join.is_finished())
    }

    async fn wait(&mut self) {
        let Some(join) = self.join.as_mut() else {
            self.subs
                .emit(Event::new(EventKind::AlreadyFinished).with_task(self.instance.clone()));
            return;
        };
        let kind = if join.is_finished() {
            EventKind::AlreadyFinished
        } else {
            EventKind::Waiting
        };
        self.subs
            .emit(Event::new(kind).with_task(self.instance.clone()));

        let outcome = match join.await {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Failure(join_failure(err)),
        };
        self.join = None;
        self.slot.fill(outcome);
    }

    fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.subs.emit(
            Event::new(EventKind::StopRequested)
                .with_task(self.instance.clone())
                .with_reason("cancellation requested"),
        );
        self.token.cancel();
    }

    async fn get_result(&mut self, opts: GetResult) -> Result<Fetched<T>, RunError> {
        if !opts.block_if_running && self.is_running() {
            return still_running(&self.instance, &self.subs, opts);
        }
        self.wait().await;
        resolve(&self.instance, &self.subs, self.slot.get(), opts)
    }
}

impl<T> Drop for CooperativeRun<T> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
