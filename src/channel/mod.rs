//! # One-shot result channels.
//!
//! Every invocation hands its final [`Outcome`] from the producer (the retry loop) to the
//! consumer (the run handle) exactly once. The substrate depends on the runner; the worker
//! pipe also carries the lifecycle events raised before the outcome.
//!
//! | Runner         | Channel                                   | End without outcome |
//! |----------------|-------------------------------------------|---------------------|
//! | Sequential     | [`Slot`], filled before the handle exists | impossible          |
//! | IsolatedWorker | [`pipe`] across the process boundary      | `Ok(None)`          |
//! | Cooperative    | the scheduled task's `JoinHandle`         | `TaskError::Canceled` |

mod pipe;
mod slot;

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

pub use pipe::{Message, Notice, PipeReceiver, PipeSender, pipe};
pub use slot::Slot;

/// Final result of one invocation after retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome<T> {
    /// The body returned a value.
    Success(T),
    /// The last captured fault.
    Failure(TaskError),
}

impl<T> Outcome<T> {
    /// True for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Converts into a plain `Result`.
    pub fn into_result(self) -> Result<T, TaskError> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(e) => Err(e),
        }
    }
}

impl<T> From<Result<T, TaskError>> for Outcome<T> {
    fn from(res: Result<T, TaskError>) -> Self {
        match res {
            Ok(v) => Outcome::Success(v),
            Err(e) => Outcome::Failure(e),
        }
    }
}
