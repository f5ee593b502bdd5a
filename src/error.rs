//! Error types used by task specifications, run handles and task bodies.
//!
//! This module defines three enums:
//!
//! - [`TaskError`]: faults raised by a task body (the retry loop's fault interface).
//! - [`RunError`]: conditions raised by [`RunHandle::get_result`](crate::RunHandle::get_result).
//! - [`ConfigError`]: invalid task specifications rejected at build time.
//!
//! `TaskError` and `RunError` provide `as_label` / `as_message` helpers for logging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// # Faults produced by a task body.
///
/// This is the fault interface of the retry loop: only [`TaskError::Fail`] is retried.
/// Everything else becomes the final outcome of the invocation immediately.
///
/// The type is serializable because isolated workers ship it back to the parent process.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskError {
    /// Non-recoverable fault (never retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Attempt failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled through its run handle.
    #[error("task cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for a retryable [`TaskError::Fail`].
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Shorthand for a non-retryable [`TaskError::Fatal`].
    pub fn fatal(error: impl std::fmt::Display) -> Self {
        TaskError::Fatal {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use runvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "cancelled".to_string(),
        }
    }

    /// Indicates whether the retry loop may try again after this fault.
    ///
    /// # Example
    /// ```
    /// use runvisor::TaskError;
    ///
    /// assert!(TaskError::fail("flaky").is_retryable());
    /// assert!(!TaskError::fatal("bad input").is_retryable());
    /// assert!(!TaskError::Canceled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }
}

/// # Conditions raised while retrieving an outcome.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Result requested without blocking while the task was still running.
    #[error("task `{instance}` is still running")]
    StillRunning {
        /// Instance name of the run.
        instance: String,
    },

    /// The task's own fault, re-raised at the retrieval site.
    #[error(transparent)]
    Failed(#[from] TaskError),
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::StillRunning { .. } => "run_still_running",
            RunError::Failed(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RunError::StillRunning { instance } => format!("still running: {instance}"),
            RunError::Failed(e) => e.as_message(),
        }
    }
}

/// # Invalid task specification.
///
/// Raised by [`TaskSpecBuilder::build`](crate::TaskSpecBuilder::build). Out-of-range but
/// finite inputs (negative or fractional retries, negative wait) are normalized instead.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Retry count is `NaN` or infinite.
    #[error("retries must be a finite number, got {given}")]
    NonFiniteRetries {
        /// The rejected value.
        given: f64,
    },

    /// Retry wait is `NaN` or infinite.
    #[error("retry wait must be a finite number of seconds, got {given}")]
    NonFiniteRetryWait {
        /// The rejected value (seconds).
        given: f64,
    },

    /// Retry wait is too large to be represented as a duration.
    #[error("retry wait of {given}s is out of range")]
    RetryWaitOutOfRange {
        /// The rejected value (seconds).
        given: f64,
    },

    /// Retry count does not fit the attempt counter.
    #[error("retries must not exceed {max}, got {given}")]
    RetriesOutOfRange {
        /// The rejected value.
        given: f64,
        /// Largest accepted retry count.
        max: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_fail_is_retryable() {
        assert!(TaskError::fail("x").is_retryable());
        assert!(!TaskError::fatal("x").is_retryable());
        assert!(!TaskError::Canceled.is_retryable());
    }

    #[test]
    fn test_run_error_wraps_task_error_transparently() {
        let err: RunError = TaskError::fail("boom").into();
        assert_eq!(err.to_string(), "execution failed: boom");
        assert_eq!(err.as_label(), "task_failed");
    }

    #[test]
    fn test_still_running_message_names_instance() {
        let err = RunError::StillRunning {
            instance: "add-1".into(),
        };
        assert_eq!(err.to_string(), "task `add-1` is still running");
        assert_eq!(err.as_label(), "run_still_running");
    }
}
