//! Domain models for the agent harness.
//!
//! # Core Concepts
//!
//! - [`Feature`]: A unit of work on the project checklist. Features are never
//!   deleted; only their [`FeatureStatus`] changes.
//! - [`Checklist`]: The persisted collection of features plus the id counter.
//! - [`ProgressEntry`]: An immutable, timestamped line in the append-only
//!   progress log.
//!
//! The two stores are independent. A progress entry may mention a feature by
//! name, but there is no structural link between them.

mod feature;
mod progress;

pub use feature::*;
pub use progress::*;
