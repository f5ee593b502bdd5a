//! # Lifecycle events emitted by task specifications and run handles.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: invocation flow (starting, attempt failed, retry, finished, failed)
//! - **Handle events**: consumer interaction (waiting, stop requested, no result)
//! - **Configuration events**: inputs normalized at build time
//!
//! The [`Event`] struct carries metadata such as timestamps, instance name,
//! attempt counters and retry delays.
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases monotonically.
//! Events raised inside an isolated worker are shipped to the parent and re-stamped there,
//! so they share the parent's sequence.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use runvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_task("fetch-42")
//!     .with_attempt(1)
//!     .with_attempts(3)
//!     .with_delay(Duration::from_millis(250));
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.task.as_deref(), Some("fetch-42"));
//! assert_eq!(ev.delay_ms, Some(250));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    // === Lifecycle events ===
    /// A task specification was invoked and a run handle created.
    ///
    /// Sets: `task` (instance name).
    TaskStarting,

    /// One attempt returned a retryable fault.
    ///
    /// Sets: `task`, `attempt`, `attempts`, `reason`.
    AttemptFailed,

    /// Next attempt scheduled after a failure.
    ///
    /// Sets: `task`, `attempt` (the attempt about to run), `attempts`, `delay_ms`.
    RetryScheduled,

    /// The body returned a value; the outcome is a success.
    ///
    /// Sets: `task`, `attempt`.
    TaskFinished,

    /// Retries are exhausted or the fault was not retryable; the outcome is a failure.
    ///
    /// Sets: `task`, `attempt`, `reason`.
    TaskFailed,

    // === Handle events ===
    /// A consumer is waiting for completion.
    ///
    /// Sets: `task`.
    Waiting,

    /// `wait` was called on a run that had already finished.
    ///
    /// Sets: `task`.
    AlreadyFinished,

    /// Cancellation or forced termination requested through `stop`.
    ///
    /// Sets: `task`.
    StopRequested,

    /// Result requested without blocking while still running (not raised).
    ///
    /// Sets: `task`.
    StillRunning,

    /// Worker ended without sending an outcome.
    ///
    /// Sets: `task`, optionally `reason`.
    NoResult,

    /// Worker execution context could not be created.
    ///
    /// Sets: `task`, `reason`.
    SpawnFailed,

    // === Configuration events ===
    /// A specification input was clamped or rounded.
    ///
    /// Sets: `task` (specification name), `reason`.
    ConfigAdjusted,
}

impl EventKind {
    /// Returns `true` for kinds that should be reported at warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            EventKind::AttemptFailed
                | EventKind::TaskFailed
                | EventKind::StopRequested
                | EventKind::StillRunning
                | EventKind::NoResult
                | EventKind::SpawnFailed
                | EventKind::ConfigAdjusted
        )
    }
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic process-wide sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Instance name (or specification name for configuration events).
    pub task: Option<Arc<str>>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// Total attempts allowed by the retry policy.
    pub attempts: Option<u32>,
    /// Delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, adjustment details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            attempt: None,
            attempts: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a task or instance name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches the total number of allowed attempts.
    #[inline]
    pub fn with_attempts(mut self, n: u32) -> Self {
        self.attempts = Some(n);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
