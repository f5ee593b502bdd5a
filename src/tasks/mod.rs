//! # Task specifications.
//!
//! - [`TaskSpec`] - immutable body + name + retry policy + runner; factory for run handles
//! - [`TaskSpecBuilder`] - fluent, validating construction of a [`TaskSpec`]

mod builder;
mod spec;

pub use builder::TaskSpecBuilder;
pub use spec::TaskSpec;
