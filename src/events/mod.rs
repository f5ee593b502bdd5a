//! Lifecycle events: the data model handed to subscribers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publishers**: `TaskSpecBuilder::build` (configuration), `TaskSpec::invoke`,
//!   the retry loop in `core`, and every run handle.
//! - **Consumers**: whatever [`SubscriberSet`](crate::SubscriberSet) the specification carries.

mod event;

pub use event::{Event, EventKind};
