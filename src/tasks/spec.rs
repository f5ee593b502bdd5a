//! # Task specification.
//!
//! A [`TaskSpec`] is the immutable description of a unit of work: the body, its display name,
//! the retry policy and the runner strategy. It is a factory: every
//! [`invoke`](TaskSpec::invoke) starts one independent run and returns its handle.
//!
//! A spec can be created:
//! - **Quickly** with [`TaskSpec::define`] (no retries, isolated worker)
//! - **Fluently** with [`TaskSpec::builder`] (name, retries, wait, jitter, runner, subscribers)
//!
//! ## Rules
//! - Nothing in a spec changes after it is built; invocations never affect each other.
//! - Every invocation gets a unique instance name `{name}-{uuid}`.
//! - With [`Sequential`](crate::Sequential), `invoke` returns only after all attempts ran.
//!
//! ## Example
//! ```rust
//! use runvisor::{Fetched, GetResult, RunHandle, Sequential, TaskError, TaskSpec};
//!
//! fn add((a, b): (i32, i32)) -> Result<i32, TaskError> {
//!     Ok(a + b)
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let spec = TaskSpec::builder()
//!     .retries(2)
//!     .runner(Sequential)
//!     .silent()
//!     .build(add)
//!     .unwrap();
//! assert_eq!(spec.name(), "add");
//!
//! let mut run = spec.invoke((3, 2));
//! assert_eq!(run.get_result(GetResult::default()).await, Ok(Fetched::Value(5)));
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::ConfigError,
    events::{Event, EventKind},
    policies::RetryPolicy,
    runners::{IsolatedWorker, Launch, Runner},
    subscribers::SubscriberSet,
};

use super::TaskSpecBuilder;

/// Immutable task specification; see the [module docs](self).
pub struct TaskSpec<F, R = IsolatedWorker> {
    name: Arc<str>,
    body: Arc<F>,
    retry: RetryPolicy,
    runner: R,
    subscribers: SubscriberSet,
}

impl TaskSpec<()> {
    /// Starts a [`TaskSpecBuilder`] with defaults.
    pub fn builder() -> TaskSpecBuilder {
        TaskSpecBuilder::new()
    }
}

impl<F> TaskSpec<F> {
    /// Specification with default settings: derived name, no retries, isolated worker.
    pub fn define(body: F) -> Result<Self, ConfigError> {
        TaskSpecBuilder::new().build(body)
    }
}

impl<F, R> TaskSpec<F, R> {
    pub(crate) fn from_parts(
        name: Arc<str>,
        body: Arc<F>,
        retry: RetryPolicy,
        runner: R,
        subscribers: SubscriberSet,
    ) -> Self {
        Self {
            name,
            body,
            retry,
            runner,
            subscribers,
        }
    }

    /// Starts one invocation with `args` and returns its handle.
    ///
    /// Returns at once for background runners; blocks until completion for
    /// [`Sequential`](crate::Sequential).
    pub fn invoke<A>(&self, args: A) -> <R as Runner<F, A>>::Handle
    where
        R: Runner<F, A>,
    {
        let instance: Arc<str> = Arc::from(format!("{}-{}", self.name, Uuid::new_v4()));
        self.subscribers.emit(
            Event::new(EventKind::TaskStarting)
                .with_task(instance.clone())
                .with_attempts(self.retry.max_attempts()),
        );

        self.runner.launch(Launch {
            instance,
            body: Arc::clone(&self.body),
            args,
            retry: self.retry,
            subscribers: self.subscribers.clone(),
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized retry policy.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Runner strategy shared by all invocations.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Lifecycle subscribers.
    pub fn subscribers(&self) -> &SubscriberSet {
        &self.subscribers
    }
}

impl<F, R: Clone> Clone for TaskSpec<F, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            body: Arc::clone(&self.body),
            retry: self.retry,
            runner: self.runner.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<F, R: fmt::Debug> fmt::Debug for TaskSpec<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSpec")
            .field("name", &self.name)
            .field("retry", &self.retry)
            .field("runner", &self.runner)
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RunError, TaskError};
    use crate::runners::{Cooperative, Fetched, GetResult, RunHandle, Sequential};
    use crate::subscribers::Subscribe;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl Subscribe for Recorder {
        fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn add((a, b): (i32, i32)) -> Result<i32, TaskError> {
        Ok(a + b)
    }

    #[tokio::test]
    async fn test_define_uses_isolated_worker() {
        let spec = TaskSpec::define(add).unwrap();
        assert_eq!(spec.name(), "add");
        assert_eq!(spec.retry().max_attempts(), 1);

        let mut run: crate::runners::WorkerRun<i32> = spec.invoke((3, 2));
        assert_eq!(run.get_result(GetResult::default()).await, Ok(Fetched::Value(5)));
    }

    #[tokio::test]
    async fn test_instance_names_are_unique() {
        let spec = TaskSpec::builder()
            .runner(Sequential)
            .silent()
            .build(add)
            .unwrap();

        let a = spec.invoke((1, 1));
        let b = spec.invoke((1, 1));
        assert!(a.instance().starts_with("add-"));
        assert_eq!(a.instance().len(), "add-".len() + 36);
        assert_ne!(a.instance(), b.instance());
    }

    #[tokio::test]
    async fn test_invocations_are_independent() {
        let spec = TaskSpec::builder()
            .runner(Sequential)
            .silent()
            .build(|x: i32| {
                if x < 0 {
                    Err(TaskError::fail("negative"))
                } else {
                    Ok(x)
                }
            })
            .unwrap();

        let mut bad = spec.invoke(-1);
        let mut good = spec.invoke(4);
        assert_eq!(
            bad.get_result(GetResult::default().raising()).await,
            Err(RunError::Failed(TaskError::fail("negative")))
        );
        assert_eq!(good.get_result(GetResult::default()).await, Ok(Fetched::Value(4)));
    }

    #[tokio::test]
    async fn test_retries_through_spec() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let spec = TaskSpec::builder()
            .retries(3)
            .runner(Sequential)
            .silent()
            .build(move |_: ()| -> Result<(), TaskError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TaskError::fail("Test fail"))
            })
            .unwrap();

        let mut run = spec.invoke(());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            run.get_result(GetResult::default()).await,
            Ok(Fetched::Failure(TaskError::fail("Test fail")))
        );
    }

    #[tokio::test]
    async fn test_lifecycle_events_for_one_invocation() {
        let rec = Arc::new(Recorder::default());
        let spec = TaskSpec::builder()
            .retries(1)
            .runner(Sequential)
            .subscribers(vec![rec.clone()])
            .build(|x: u8| Ok::<_, TaskError>(x))
            .unwrap();

        let mut run = spec.invoke(9);
        run.wait().await;

        let events = rec.0.lock().unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::TaskStarting,
                EventKind::TaskFinished,
                EventKind::AlreadyFinished
            ]
        );
        assert_eq!(events[0].attempts, Some(2));
        assert!(events.iter().all(|e| e.task.as_deref() == Some(run.instance())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooperative_spec_overlaps() {
        let spec = TaskSpec::builder()
            .runner(Cooperative::new())
            .silent()
            .build(|secs: u64| async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                Ok::<_, TaskError>(secs)
            })
            .unwrap();

        let started = tokio::time::Instant::now();
        let mut first = spec.invoke(1);
        let mut second = spec.invoke(2);
        assert_eq!(first.get_result(GetResult::default()).await, Ok(Fetched::Value(1)));
        assert_eq!(second.get_result(GetResult::default()).await, Ok(Fetched::Value(2)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_clone_shares_body() {
        let spec = TaskSpec::builder()
            .name("shared")
            .runner(Sequential)
            .silent()
            .build(add)
            .unwrap();
        let copy = spec.clone();
        assert_eq!(copy.name(), "shared");
        assert!(Arc::ptr_eq(&spec.body, &copy.body));
    }
}
