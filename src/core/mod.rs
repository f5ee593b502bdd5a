//! Execution core: the retry-wrapped invocation shared by all runners.
//!
//! Internal modules:
//! - [`retry`]: drives attempts under a [`RetryPolicy`](crate::RetryPolicy), blocking or async.

pub(crate) mod retry;

use std::any::Any;

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
