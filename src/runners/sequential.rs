//! # Sequential runner.
//!
//! Runs the retry-wrapped body on the caller's thread inside
//! [`TaskSpec::invoke`](crate::TaskSpec::invoke). Invocation therefore **blocks** until the
//! body and all retries (including retry waits) are done; pick another runner when the caller
//! must not block.
//!
//! The handle is born finished: `is_running` is always `false`, `wait` and `stop` do nothing,
//! and the outcome lives in an in-memory [`Slot`]. A panic in the body unwinds into the caller.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    channel::Slot,
    core::retry,
    error::{RunError, TaskError},
    events::{Event, EventKind},
    subscribers::SubscriberSet,
};

use super::{Fetched, GetResult, Launch, RunHandle, Runner, resolve};

/// Runs invocations synchronously on the invoking thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sequential;

/// Handle of a sequential run (always finished).
#[derive(Debug)]
pub struct SequentialRun<T> {
    instance: Arc<str>,
    subs: SubscriberSet,
    slot: Slot<T>,
}

impl<F, A, T> Runner<F, A> for Sequential
where
    F: Fn(A) -> Result<T, TaskError> + Send + Sync + 'static,
    A: Clone,
    T: Clone + Send + 'static,
{
    type Handle = SequentialRun<T>;

    fn launch(&self, launch: Launch<F, A>) -> SequentialRun<T> {
        let outcome = retry::run_blocking(
            launch.body.as_ref(),
            &launch.args,
            &launch.retry,
            &launch.instance,
            &launch.subscribers,
        );
        SequentialRun {
            instance: launch.instance,
            subs: launch.subscribers,
            slot: Slot::filled(outcome),
        }
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> RunHandle for SequentialRun<T> {
    type Output = T;

    fn instance(&self) -> &str {
        &self.instance
    }

    fn is_running(&mut self) -> bool {
        false
    }

    async fn wait(&mut self) {
        self.subs
            .emit(Event::new(EventKind::AlreadyFinished).with_task(self.instance.clone()));
    }

    fn stop(&mut self) {}

    async fn get_result(&mut self, opts: GetResult) -> Result<Fetched<T>, RunError> {
        resolve(&self.instance, &self.subs, self.slot.get(), opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::RetryPolicy;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn launch<F, A>(body: F, args: A, retries: u32) -> Launch<F, A> {
        Launch {
            instance: Arc::from("seq-test"),
            body: Arc::new(body),
            args,
            retry: RetryPolicy::new(retries, Duration::ZERO),
            subscribers: SubscriberSet::silent(),
        }
    }

    #[tokio::test]
    async fn test_result_is_ready_at_construction() {
        let mut run = Sequential.launch(launch(
            |(a, b): (i32, i32)| Ok::<_, TaskError>(a + b),
            (3, 2),
            0,
        ));
        assert!(!run.is_running());
        assert_eq!(run.get_result(GetResult::default()).await, Ok(Fetched::Value(5)));
        assert_eq!(
            run.get_result(GetResult::default().non_blocking()).await,
            Ok(Fetched::Value(5))
        );
    }

    #[tokio::test]
    async fn test_all_attempts_run_before_invoke_returns() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let run = Sequential.launch(launch(
            move |_: ()| -> Result<(), TaskError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TaskError::fail("always"))
            },
            (),
            3,
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        drop(run);
    }

    #[tokio::test]
    async fn test_failure_raised_or_returned() {
        let mut run = Sequential.launch(launch(
            |_: ()| -> Result<u8, TaskError> { Err(TaskError::fail("boom")) },
            (),
            1,
        ));
        assert_eq!(
            run.get_result(GetResult::default()).await,
            Ok(Fetched::Failure(TaskError::fail("boom")))
        );
        assert_eq!(
            run.get_result(GetResult::default().raising()).await,
            Err(RunError::Failed(TaskError::fail("boom")))
        );
    }

    #[tokio::test]
    async fn test_wait_and_stop_are_noops() {
        let mut run = Sequential.launch(launch(|x: u8| Ok::<_, TaskError>(x), 7, 0));
        run.stop();
        run.wait().await;
        run.stop();
        assert_eq!(run.get_result(GetResult::default()).await, Ok(Fetched::Value(7)));
    }
}
