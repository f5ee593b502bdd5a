//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom event handlers into
//! task specifications and their run handles.
//!
//! ## Rules
//! - `on_event` is called **inline** by the publisher (the invoking thread, the retry loop,
//!   or the worker process), so it must be cheap and must not block.
//! - Panics are caught by [`SubscriberSet`](crate::SubscriberSet) and never reach the task.
//! - Subscribers observe; nothing they do changes control flow.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use runvisor::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct Retries(AtomicUsize);
//!
//! impl Subscribe for Retries {
//!     fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::RetryScheduled {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "retries" }
//! }
//! ```

use crate::events::Event;

/// Lifecycle event subscriber.
///
/// ### Implementation requirements
/// - Return quickly; offload heavy work to your own queue.
/// - Handle errors internally; do not panic.
/// - Expect calls from worker processes as well as from the parent: a subscriber
///   that aggregates state in memory only sees the events of its own process.
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in diagnostics.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
