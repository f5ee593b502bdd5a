//! # Retry-wrapped invocation.
//!
//! Runs a task body up to `retries + 1` times, publishing lifecycle events, and returns the
//! final [`Outcome`]. Two drivers share the same bookkeeping ([`RetryState`]) and differ only
//! in how they wait between attempts:
//!
//! - [`run_blocking`] sleeps the current thread (Sequential, IsolatedWorker);
//! - [`run_async`] suspends on `tokio::time::sleep` (Cooperative).
//!
//! ## Event flow
//! ```text
//! attempt N ─► Ok(v)           ─► TaskFinished             ─► Success(v)
//!           └► Err(e)          ─► AttemptFailed
//!                 ├─ Retry     ─► RetryScheduled{N+1, delay} ─► sleep ─► attempt N+1
//!                 └─ GiveUp    ─► TaskFailed                 ─► Failure(e)
//! ```
//!
//! Events go to a [`Report`] sink: the subscriber set in-process, or the outcome pipe inside
//! a worker so the parent re-emits them.
//!
//! ## Rules
//! - Attempts run **sequentially** (never in parallel for one invocation)
//! - Every attempt gets its own clone of the arguments
//! - Only retryable faults ([`TaskError::is_retryable`]) are retried

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    channel::Outcome,
    error::TaskError,
    events::{Event, EventKind},
    policies::{RetryPolicy, RetryState, Verdict},
    subscribers::SubscriberSet,
};

/// Destination of the events raised by the retry loop.
pub(crate) trait Report {
    fn report(&self, event: Event);
}

impl Report for SubscriberSet {
    fn report(&self, event: Event) {
        self.emit(event);
    }
}

/// Runs `body` under `policy`, sleeping the current thread between attempts.
pub fn run_blocking<F, A, T, S>(
    body: &F,
    args: &A,
    policy: &RetryPolicy,
    instance: &str,
    subs: &S,
) -> Outcome<T>
where
    F: Fn(A) -> Result<T, TaskError> + ?Sized,
    A: Clone,
    S: Report + ?Sized,
{
    let mut state = policy.start();
    loop {
        state.begin();
        match body(args.clone()) {
            Ok(value) => {
                publish_finished(subs, instance, &state);
                return Outcome::Success(value);
            }
            Err(err) => match settle(&mut state, err, instance, subs) {
                Verdict::Retry { delay } => {
                    if delay > Duration::ZERO {
                        std::thread::sleep(delay);
                    }
                }
                Verdict::GiveUp(err) => return Outcome::Failure(err),
            },
        }
    }
}

/// Runs `body` under `policy`, suspending on the tokio timer between attempts.
pub async fn run_async<F, Fut, A, T>(
    body: Arc<F>,
    args: A,
    policy: RetryPolicy,
    instance: Arc<str>,
    subs: SubscriberSet,
) -> Outcome<T>
where
    F: Fn(A) -> Fut + ?Sized,
    Fut: Future<Output = Result<T, TaskError>>,
    A: Clone,
{
    let mut state = policy.start();
    loop {
        state.begin();
        match (*body)(args.clone()).await {
            Ok(value) => {
                publish_finished(&subs, &instance, &state);
                return Outcome::Success(value);
            }
            Err(err) => match settle(&mut state, err, &instance, &subs) {
                Verdict::Retry { delay } => tokio::time::sleep(delay).await,
                Verdict::GiveUp(err) => return Outcome::Failure(err),
            },
        }
    }
}

/// Records a failed attempt and publishes what happens next.
fn settle<S: Report + ?Sized>(
    state: &mut RetryState,
    err: TaskError,
    instance: &str,
    subs: &S,
) -> Verdict {
    subs.report(
        Event::new(EventKind::AttemptFailed)
            .with_task(instance)
            .with_attempt(state.attempt())
            .with_attempts(state.max_attempts())
            .with_reason(err.to_string()),
    );

    let verdict = state.fail(err);
    match &verdict {
        Verdict::Retry { delay } => subs.report(
            Event::new(EventKind::RetryScheduled)
                .with_task(instance)
                .with_attempt(state.attempt() + 1)
                .with_attempts(state.max_attempts())
                .with_delay(*delay),
        ),
        Verdict::GiveUp(err) => subs.report(
            Event::new(EventKind::TaskFailed)
                .with_task(instance)
                .with_attempt(state.attempt())
                .with_attempts(state.max_attempts())
                .with_reason(err.to_string()),
        ),
    }
    verdict
}

fn publish_finished<S: Report + ?Sized>(subs: &S, instance: &str, state: &RetryState) {
    subs.report(
        Event::new(EventKind::TaskFinished)
            .with_task(instance)
            .with_attempt(state.attempt())
            .with_attempts(state.max_attempts()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::Subscribe;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    impl Subscribe for Recorder {
        fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.kind);
        }
    }

    #[test]
    fn test_success_on_first_attempt() {
        let out = run_blocking(
            &|x: u32| Ok::<_, TaskError>(x * 2),
            &21,
            &RetryPolicy::new(3, Duration::ZERO),
            "double-1",
            &SubscriberSet::silent(),
        );
        assert_eq!(out, Outcome::Success(42));
    }

    #[test]
    fn test_always_failing_body_runs_retries_plus_one() {
        let calls = AtomicU32::new(0);
        let body = |_: ()| -> Result<(), TaskError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TaskError::fail("nope"))
        };
        let out = run_blocking(
            &body,
            &(),
            &RetryPolicy::new(3, Duration::ZERO),
            "nope-1",
            &SubscriberSet::silent(),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(out, Outcome::Failure(TaskError::fail("nope")));
    }

    #[test]
    fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let body = |_: ()| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(TaskError::fail(format!("boom #{n}")))
            } else {
                Ok(n)
            }
        };
        let out = run_blocking(
            &body,
            &(),
            &RetryPolicy::new(5, Duration::ZERO),
            "flaky-1",
            &SubscriberSet::silent(),
        );
        assert_eq!(out, Outcome::Success(3));
    }

    #[test]
    fn test_fatal_is_not_retried() {
        let calls = AtomicU32::new(0);
        let body = |_: ()| -> Result<(), TaskError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TaskError::fatal("bad input"))
        };
        let out = run_blocking(
            &body,
            &(),
            &RetryPolicy::new(3, Duration::ZERO),
            "fatal-1",
            &SubscriberSet::silent(),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(out, Outcome::Failure(TaskError::fatal("bad input")));
    }

    #[test]
    fn test_event_sequence_for_one_retry() {
        let rec = Arc::new(Recorder::default());
        let subs = SubscriberSet::new(vec![rec.clone()]);
        let calls = AtomicU32::new(0);
        let body = |_: ()| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TaskError::fail("first"))
            } else {
                Ok(())
            }
        };
        let _ = run_blocking(&body, &(), &RetryPolicy::new(1, Duration::ZERO), "seq-1", &subs);

        assert_eq!(
            *rec.0.lock().unwrap(),
            vec![
                EventKind::AttemptFailed,
                EventKind::RetryScheduled,
                EventKind::TaskFinished
            ]
        );
    }

    #[derive(Default)]
    struct Sink(Mutex<Vec<(EventKind, Option<u32>)>>);

    impl Report for Sink {
        fn report(&self, event: Event) {
            self.0.lock().unwrap().push((event.kind, event.attempt));
        }
    }

    #[test]
    fn test_events_go_to_any_report_sink() {
        let sink = Sink::default();
        let out = run_blocking(
            &|_: ()| -> Result<(), TaskError> { Err(TaskError::fatal("bad input")) },
            &(),
            &RetryPolicy::new(2, Duration::ZERO),
            "sink-1",
            &sink,
        );
        assert_eq!(out, Outcome::Failure(TaskError::fatal("bad input")));
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![
                (EventKind::AttemptFailed, Some(1)),
                (EventKind::TaskFailed, Some(1))
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_driver_waits_between_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let body = Arc::new(move |_: ()| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TaskError::fail("down"))
            }
        });

        let started = tokio::time::Instant::now();
        let out = run_async(
            body,
            (),
            RetryPolicy::new(2, Duration::from_secs(5)),
            Arc::from("down-1"),
            SubscriberSet::silent(),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert!(started.elapsed() < Duration::from_secs(11));
        assert_eq!(out, Outcome::Failure(TaskError::fail("down")));
    }
}
