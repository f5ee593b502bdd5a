//! # Fluent construction of task specifications.
//!
//! [`TaskSpecBuilder`] collects the raw, possibly sloppy inputs of a specification and
//! turns them into a validated [`TaskSpec`] in [`build`](TaskSpecBuilder::build).
//!
//! ## Build steps
//! ```text
//! name?      ─► given, else the body's fn name, else "task"
//! retries    ─┐
//! retry_wait ─┴► RetryPolicy::normalize ─► Err(ConfigError)     (NaN, ±inf, too large)
//!                                       └► (policy, adjustments) ─► one ConfigAdjusted each
//! jitter     ─► policy.with_jitter
//! ```
//!
//! Adjustments are warnings, never errors: a negative retry count still builds.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    error::ConfigError,
    events::{Event, EventKind},
    policies::{JitterPolicy, RetryPolicy},
    runners::IsolatedWorker,
    subscribers::{Subscribe, SubscriberSet},
};

use super::TaskSpec;

/// Fallback display name for bodies without an intrinsic one.
const DEFAULT_NAME: &str = "task";

/// Builder for [`TaskSpec`] with a fluent API.
///
/// The runner is part of the type: [`runner`](Self::runner) switches it and the default is
/// [`IsolatedWorker`].
#[derive(Clone, Debug)]
pub struct TaskSpecBuilder<R = IsolatedWorker> {
    name: Option<Cow<'static, str>>,
    retries: f64,
    retry_wait_secs: f64,
    jitter: JitterPolicy,
    runner: R,
    subscribers: SubscriberSet,
}

impl TaskSpecBuilder {
    /// Creates a builder with no retries, no wait and the isolated-worker runner.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Creates a builder inheriting retry defaults from `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            name: None,
            retries: f64::from(cfg.retries),
            retry_wait_secs: cfg.retry_wait.as_secs_f64(),
            jitter: cfg.jitter,
            runner: IsolatedWorker,
            subscribers: SubscriberSet::default(),
        }
    }
}

impl Default for TaskSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TaskSpecBuilder<R> {
    /// Sets the display name. An empty name falls back to the derived one.
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the retry count. Negative values clamp to 0 and fractions round, with a warning.
    pub fn retries(mut self, retries: impl Into<f64>) -> Self {
        self.retries = retries.into();
        self
    }

    /// Sets the wait between attempts.
    pub fn retry_wait(mut self, wait: Duration) -> Self {
        self.retry_wait_secs = wait.as_secs_f64();
        self
    }

    /// Sets the retry wait in seconds. Negative values clamp to 0 with a warning.
    pub fn retry_wait_secs(mut self, secs: impl Into<f64>) -> Self {
        self.retry_wait_secs = secs.into();
        self
    }

    /// Sets the jitter applied to each retry wait.
    pub fn jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Switches the runner strategy.
    pub fn runner<R2>(self, runner: R2) -> TaskSpecBuilder<R2> {
        TaskSpecBuilder {
            name: self.name,
            retries: self.retries,
            retry_wait_secs: self.retry_wait_secs,
            jitter: self.jitter,
            runner,
            subscribers: self.subscribers,
        }
    }

    /// Replaces the lifecycle subscribers (default: a single [`LogWriter`](crate::LogWriter)).
    pub fn subscribers(mut self, subs: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = SubscriberSet::new(subs);
        self
    }

    /// Drops all lifecycle subscribers.
    pub fn silent(mut self) -> Self {
        self.subscribers = SubscriberSet::silent();
        self
    }

    /// Validates the inputs and builds the specification around `body`.
    ///
    /// Whether `body` can be invoked with a given argument type under the chosen runner is
    /// checked by the compiler at [`TaskSpec::invoke`].
    pub fn build<F>(self, body: F) -> Result<TaskSpec<F, R>, ConfigError> {
        let name: Arc<str> = match self.name {
            Some(name) if !name.is_empty() => Arc::from(&*name),
            _ => Arc::from(intrinsic_name::<F>().unwrap_or(DEFAULT_NAME)),
        };

        let (policy, adjustments) = RetryPolicy::normalize(self.retries, self.retry_wait_secs)?;
        for adjustment in adjustments {
            self.subscribers.emit(
                Event::new(EventKind::ConfigAdjusted)
                    .with_task(name.clone())
                    .with_reason(adjustment.to_string()),
            );
        }

        Ok(TaskSpec::from_parts(
            name,
            Arc::new(body),
            policy.with_jitter(self.jitter),
            self.runner,
            self.subscribers,
        ))
    }
}

/// Name of a function item, derived from its type.
///
/// Closures, function pointers and trait objects have no usable name.
fn intrinsic_name<F>() -> Option<&'static str> {
    let full = std::any::type_name::<F>();
    if full.contains("dyn ") || full.contains("{{closure}}") || full.starts_with("fn(") {
        return None;
    }
    let path = full.split('<').next().unwrap_or(full);
    let last = path.rsplit("::").next().unwrap_or(path);
    let plain = !last.is_empty() && last.chars().all(|c| c.is_alphanumeric() || c == '_');
    plain.then_some(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::events::Event;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Event>>);

    impl Subscribe for Recorder {
        fn on_event(&self, event: &Event) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn triple(x: u32) -> Result<u32, TaskError> {
        Ok(x * 3)
    }

    #[test]
    fn test_name_of_fn_item() {
        assert_eq!(intrinsic_name::<fn(u32) -> Result<u32, TaskError>>(), None);
        let spec = TaskSpecBuilder::new().build(triple).unwrap();
        assert_eq!(spec.name(), "triple");
    }

    #[test]
    fn test_closure_gets_default_name() {
        let spec = TaskSpecBuilder::new()
            .build(|x: u32| Ok::<_, TaskError>(x))
            .unwrap();
        assert_eq!(spec.name(), "task");
    }

    #[test]
    fn test_explicit_name_wins_unless_empty() {
        let named = TaskSpecBuilder::new().name("resize").build(triple).unwrap();
        assert_eq!(named.name(), "resize");

        let empty = TaskSpecBuilder::new().name("").build(triple).unwrap();
        assert_eq!(empty.name(), "triple");
    }

    #[test]
    fn test_adjustments_are_reported() {
        let rec = Arc::new(Recorder::default());
        let spec = TaskSpecBuilder::new()
            .name("sloppy")
            .retries(-2)
            .retry_wait_secs(-1.5)
            .subscribers(vec![rec.clone()])
            .build(triple)
            .unwrap();

        assert_eq!(spec.retry().retries(), 0);
        assert_eq!(spec.retry().wait(), Duration::ZERO);

        let events = rec.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == EventKind::ConfigAdjusted));
        assert!(events.iter().all(|e| e.task.as_deref() == Some("sloppy")));
    }

    #[test]
    fn test_fractional_retries_round() {
        let rec = Arc::new(Recorder::default());
        let spec = TaskSpecBuilder::new()
            .retries(2.6)
            .subscribers(vec![rec.clone()])
            .build(triple)
            .unwrap();
        assert_eq!(spec.retry().retries(), 3);
        assert_eq!(rec.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_clean_inputs_report_nothing() {
        let rec = Arc::new(Recorder::default());
        let spec = TaskSpecBuilder::new()
            .retries(4)
            .retry_wait(Duration::from_millis(250))
            .subscribers(vec![rec.clone()])
            .build(triple)
            .unwrap();
        assert_eq!(spec.retry().retries(), 4);
        assert_eq!(spec.retry().wait(), Duration::from_millis(250));
        assert!(rec.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_inputs_are_rejected() {
        let err = TaskSpecBuilder::new().retries(f64::NAN).build(triple).unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteRetries { .. }));

        let err = TaskSpecBuilder::new()
            .retry_wait_secs(f64::INFINITY)
            .build(triple)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonFiniteRetryWait { .. }));
    }

    #[test]
    fn test_from_config_inherits_defaults() {
        let cfg = Config {
            retries: 2,
            retry_wait: Duration::from_secs(1),
            jitter: JitterPolicy::Equal,
        };
        let spec = TaskSpecBuilder::from_config(&cfg).build(triple).unwrap();
        assert_eq!(spec.retry(), &cfg.retry_policy());
    }
}
