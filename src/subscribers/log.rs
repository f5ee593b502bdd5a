//! # LogWriter: lifecycle events to `tracing`
//!
//! Forwards every [`Event`] to the `tracing` facade under the `runvisor` target.
//! Warning kinds ([`EventKind::is_warning`]) are emitted at `WARN`, everything else at `INFO`.
//! Without an installed `tracing` subscriber this is a no-op.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO runvisor: starting task task=sum-6f1c…
//! WARN runvisor: attempt failed task=sum-6f1c… attempt=1 attempts=3 reason="execution failed: boom"
//! INFO runvisor: retry scheduled task=sum-6f1c… attempt=2 attempts=3 delay_ms=2000
//! INFO runvisor: finished task task=sum-6f1c… attempt=2
//! WARN runvisor: no result task=sum-6f1c…
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// `tracing` forwarding subscriber (the default sink).
#[derive(Default, Debug, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn message(kind: EventKind) -> &'static str {
    match kind {
        EventKind::TaskStarting => "starting task",
        EventKind::AttemptFailed => "attempt failed",
        EventKind::RetryScheduled => "retry scheduled",
        EventKind::TaskFinished => "finished task",
        EventKind::TaskFailed => "task failed",
        EventKind::Waiting => "waiting for task to finish",
        EventKind::AlreadyFinished => "task is already finished",
        EventKind::StopRequested => "stopping task",
        EventKind::StillRunning => "task is still running",
        EventKind::NoResult => "no result",
        EventKind::SpawnFailed => "worker spawn failed",
        EventKind::ConfigAdjusted => "specification adjusted",
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let msg = message(e.kind);
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref();
        if e.kind.is_warning() {
            tracing::warn!(
                target: "runvisor",
                task,
                attempt = e.attempt,
                attempts = e.attempts,
                reason,
                seq = e.seq,
                "{msg}"
            );
        } else {
            tracing::info!(
                target: "runvisor",
                task,
                attempt = e.attempt,
                attempts = e.attempts,
                delay_ms = e.delay_ms,
                seq = e.seq,
                "{msg}"
            );
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
