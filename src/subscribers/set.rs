//! # SubscriberSet: inline fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to every subscriber in registration order.
//!
//! ## What it guarantees
//! - Panics inside subscribers are caught and logged (isolation).
//! - An empty set is a valid no-op sink.
//! - Cloning is cheap (shared slice of subscribers).
//!
//! ## Diagram
//! ```text
//!    emit(Event)
//!        ├──► catch_unwind(S1.on_event)
//!        ├──► catch_unwind(S2.on_event)
//!        └──► catch_unwind(SN.on_event)
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::events::Event;

use super::{LogWriter, Subscribe};

/// Composite fan-out handed to every run of a task specification.
#[derive(Clone)]
pub struct SubscriberSet {
    subs: Arc<[Arc<dyn Subscribe>]>,
}

impl SubscriberSet {
    /// Creates a set from the given subscribers.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs: subs.into() }
    }

    /// Creates a set with no subscribers (events are dropped).
    #[must_use]
    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    /// Delivers one event to all subscribers.
    pub fn emit(&self, event: Event) {
        for sub in self.subs.iter() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| sub.on_event(&event)));
            if delivered.is_err() {
                tracing::warn!(subscriber = sub.name(), "subscriber panicked; event dropped");
            }
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len()
    }
}

impl Default for SubscriberSet {
    /// A set holding a single [`LogWriter`].
    fn default() -> Self {
        Self::new(vec![Arc::new(LogWriter)])
    }
}

impl std::fmt::Debug for SubscriberSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.subs.iter().map(|s| s.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(Arc<AtomicUsize>);

    impl Subscribe for Counter {
        fn on_event(&self, _event: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panicky;

    impl Subscribe for Panicky {
        fn on_event(&self, _event: &Event) {
            panic!("subscriber bug");
        }

        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[test]
    fn test_emit_reaches_every_subscriber() {
        let hits = Arc::new(AtomicUsize::new(0));
        let set = SubscriberSet::new(vec![
            Arc::new(Counter(hits.clone())),
            Arc::new(Counter(hits.clone())),
        ]);
        set.emit(Event::new(EventKind::TaskStarting));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let hits = Arc::new(AtomicUsize::new(0));
        let set = SubscriberSet::new(vec![Arc::new(Panicky), Arc::new(Counter(hits.clone()))]);
        set.emit(Event::new(EventKind::TaskFinished));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_silent_set_is_empty() {
        let set = SubscriberSet::silent();
        assert!(set.is_empty());
        set.emit(Event::new(EventKind::Waiting));
    }
}
