//! # Isolated-worker runner.
//!
//! Each invocation forks a worker process. The retry loop runs entirely inside the worker,
//! which streams its lifecycle events and then the final [`Outcome`] through a [`pipe`]
//! opened before the fork, and exits. The parent never shares mutable state with the worker.
//!
//! ## Lifecycle
//! ```text
//! invoke ─► pipe() ─► fork()
//!             parent: close write end ─► reader thread ─► WorkerRun { pid, delivery }
//!             worker: close read end  ─► run_blocking ─► send(events.., outcome) ─► _exit
//!
//! reader ─► drain pipe ─► notices re-emitted to subscribers ─► oneshot(outcome)
//! wait   ─► await oneshot ─► reap pid
//! stop   ─► SIGKILL ─► reap pid ─► outcome discarded ─► NoResult
//! drop   ─► SIGKILL + reap if still owned
//! ```
//!
//! ## Rules
//! - Outcomes cross the boundary as JSON, so `T` must be `Serialize + DeserializeOwned`.
//! - Subscribers only ever run in the parent; the worker never touches them.
//! - The pipe is drained as soon as the worker writes, so outcomes of any size complete
//!   without a consumer waiting on them.
//! - A panic inside the worker becomes `Failure(TaskError::Fatal)`; it never unwinds into the
//!   parent's stack.
//! - A worker killed by a signal yields no outcome, even if it left a partial line behind.
//! - If the worker cannot be started the handle is born finished with a `Fatal` outcome.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::{
    channel::{Message, Notice, Outcome, PipeReceiver, PipeSender, Slot, pipe},
    core::{
        panic_message,
        retry::{self, Report},
    },
    error::{RunError, TaskError},
    events::{Event, EventKind},
    subscribers::SubscriberSet,
};

use super::{Fetched, GetResult, Launch, RunHandle, Runner, resolve, still_running};

/// Exit code of a worker whose body panicked.
const PANIC_EXIT: i32 = 101;

/// Exit code of a worker that could not write its outcome.
const SEND_EXIT: i32 = 1;

/// What the reader thread saw on the pipe.
type Delivery<T> = io::Result<Option<Outcome<T>>>;

/// Runs each invocation in a forked worker process.
#[derive(Clone, Copy, Debug, Default)]
pub struct IsolatedWorker;

/// Handle of a worker-process run.
#[derive(Debug)]
pub struct WorkerRun<T> {
    instance: Arc<str>,
    subs: SubscriberSet,
    /// Worker pid until it has been reaped.
    child: Option<Pid>,
    /// Reader's report until it has been consumed or discarded.
    delivery: Option<oneshot::Receiver<Delivery<T>>>,
    slot: Slot<T>,
}

impl<F, A, T> Runner<F, A> for IsolatedWorker
where
    F: Fn(A) -> Result<T, TaskError> + Send + Sync + 'static,
    A: Clone,
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    type Handle = WorkerRun<T>;

    fn launch(&self, launch: Launch<F, A>) -> WorkerRun<T> {
        match spawn(&launch) {
            Ok((pid, delivery)) => WorkerRun {
                instance: launch.instance,
                subs: launch.subscribers,
                child: Some(pid),
                delivery: Some(delivery),
                slot: Slot::empty(),
            },
            Err(err) => unstarted(launch.instance, launch.subscribers, &err),
        }
    }
}

/// Finished handle for a worker that never started.
fn unstarted<T>(instance: Arc<str>, subs: SubscriberSet, err: &io::Error) -> WorkerRun<T> {
    subs.emit(
        Event::new(EventKind::SpawnFailed)
            .with_task(instance.clone())
            .with_reason(err.to_string()),
    );
    WorkerRun {
        instance,
        subs,
        child: None,
        delivery: None,
        slot: Slot::filled(Outcome::Failure(TaskError::fatal(format!(
            "failed to start worker: {err}"
        )))),
    }
}

/// Opens the pipe, forks the worker and starts the parent-side reader.
fn spawn<F, A, T>(launch: &Launch<F, A>) -> io::Result<(Pid, oneshot::Receiver<Delivery<T>>)>
where
    F: Fn(A) -> Result<T, TaskError>,
    A: Clone,
    T: Serialize + DeserializeOwned + Send + 'static,
{
    let (tx, rx) = pipe::<T>()?;

    // SAFETY: the child only runs the task body, writes to its pipe and calls `_exit`;
    // it never returns into the caller's stack or touches the parent's runtime.
    match unsafe { fork() }? {
        ForkResult::Parent { child } => {
            drop(tx);
            match start_reader(child, rx, launch.instance.clone(), launch.subscribers.clone()) {
                Ok(delivery) => Ok((child, delivery)),
                Err(err) => {
                    let _ = signal::kill(child, Signal::SIGKILL);
                    let _ = waitpid(child, None);
                    Err(err)
                }
            }
        }
        ForkResult::Child => {
            drop(rx);
            worker_main(launch, tx)
        }
    }
}

/// Drains the worker's pipe on a dedicated thread, re-emitting its events here.
fn start_reader<T>(
    child: Pid,
    rx: PipeReceiver<T>,
    instance: Arc<str>,
    subs: SubscriberSet,
) -> io::Result<oneshot::Receiver<Delivery<T>>>
where
    T: DeserializeOwned + Send + 'static,
{
    let (done, delivery) = oneshot::channel();
    std::thread::Builder::new()
        .name(format!("runvisor-worker-{child}"))
        .spawn(move || {
            let got = rx.drain(|notice| subs.emit(notice.into_event(instance.clone())));
            let _ = done.send(got);
        })?;
    Ok(delivery)
}

impl<T: Serialize> Report for PipeSender<T> {
    fn report(&self, event: Event) {
        let _ = self.send(&Message::Event(Notice::from(&event)));
    }
}

/// Body of the worker process.
fn worker_main<F, A, T>(launch: &Launch<F, A>, tx: PipeSender<T>) -> !
where
    F: Fn(A) -> Result<T, TaskError>,
    A: Clone,
    T: Serialize,
{
    let run = panic::catch_unwind(AssertUnwindSafe(|| {
        retry::run_blocking(
            launch.body.as_ref(),
            &launch.args,
            &launch.retry,
            &launch.instance,
            &tx,
        )
    }));

    let (outcome, code) = match run {
        Ok(outcome) => (outcome, 0),
        Err(payload) => (
            Outcome::Failure(TaskError::fatal(format!(
                "worker panicked: {}",
                panic_message(payload.as_ref())
            ))),
            PANIC_EXIT,
        ),
    };

    let code = match tx.send(&Message::Outcome(outcome)) {
        Ok(()) => code,
        Err(_) => SEND_EXIT,
    };
    // SAFETY: `_exit` skips atexit handlers and destructors inherited from the parent,
    // which must not run twice.
    unsafe { libc::_exit(code) }
}

/// Waits for `pid`. When `force` is set a still-alive worker is killed first.
///
/// Returns true if the worker was killed by a signal we did not send.
fn reap(pid: Pid, force: bool) -> bool {
    if force {
        match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => {
                let _ = signal::kill(pid, Signal::SIGKILL);
                let _ = waitpid(pid, None);
                return false;
            }
            status => return matches!(status, Ok(WaitStatus::Signaled(..))),
        }
    }
    matches!(waitpid(pid, None), Ok(WaitStatus::Signaled(..)))
}

/// Maps what the reader saw to the outcome to store.
///
/// `None` (from a closed reader) means the reader itself went away.
fn delivered<T>(delivery: Option<Delivery<T>>, signaled: bool) -> Option<Outcome<T>> {
    match delivery {
        Some(Ok(outcome)) => outcome,
        _ if signaled => None,
        Some(Err(err)) => Some(Outcome::Failure(TaskError::fatal(format!(
            "unreadable worker outcome: {err}"
        )))),
        None => Some(Outcome::Failure(TaskError::fatal(
            "worker outcome reader stopped",
        ))),
    }
}

impl<T> WorkerRun<T> {
    /// Consumes the reader's report if it is ready.
    fn poll_delivery(&mut self) {
        let Some(rx) = self.delivery.as_mut() else {
            return;
        };
        let got = match rx.try_recv() {
            Ok(got) => Some(got),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Closed) => None,
        };
        self.delivery = None;
        self.finish(got);
    }

    /// Reaps the worker and stores its outcome.
    fn finish(&mut self, delivery: Option<Delivery<T>>) {
        let clean = matches!(delivery, Some(Ok(_)));
        let signaled = self.child.take().is_some_and(|pid| reap(pid, !clean));
        if let Some(outcome) = delivered(delivery, signaled) {
            self.slot.fill(outcome);
        }
    }
}

#[async_trait]
impl<T> RunHandle for WorkerRun<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    type Output = T;

    fn instance(&self) -> &str {
        &self.instance
    }

    fn is_running(&mut self) -> bool {
        self.poll_delivery();
        self.delivery.is_some()
    }

    async fn wait(&mut self) {
        self.poll_delivery();
        let Some(rx) = self.delivery.as_mut() else {
            self.subs
                .emit(Event::new(EventKind::AlreadyFinished).with_task(self.instance.clone()));
            return;
        };
        self.subs
            .emit(Event::new(EventKind::Waiting).with_task(self.instance.clone()));

        let got = rx.await.ok();
        self.delivery = None;
        self.finish(got);
    }

    fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.subs.emit(
            Event::new(EventKind::StopRequested)
                .with_task(self.instance.clone())
                .with_reason("forced termination"),
        );
        self.delivery = None;
        if let Some(pid) = self.child.take() {
            let _ = signal::kill(pid, Signal::SIGKILL);
            let _ = waitpid(pid, None);
        }
    }

    async fn get_result(&mut self, opts: GetResult) -> Result<Fetched<T>, RunError> {
        if !opts.block_if_running && self.is_running() {
            return still_running(&self.instance, &self.subs, opts);
        }
        self.wait().await;
        resolve(&self.instance, &self.subs, self.slot.get(), opts)
    }
}

impl<T> Drop for WorkerRun<T> {
    fn drop(&mut self) {
        if let Some(pid) = self.child.take() {
            let _ = signal::kill(pid, Signal::SIGKILL);
            let _ = waitpid(pid, None);
        }
    }
}
