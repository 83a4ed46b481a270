//! Agent harness: a feature checklist and an append-only progress log that
//! carry a memory-less coding agent from one session to the next.
//!
//! State lives in the project directory (see [`project`]). The
//! [`hooks`] surface it to the agent when a session starts and remind it to
//! record progress when a session stops.

pub mod config;
pub mod error;
pub mod hooks;
pub mod mcp;
pub mod models;
pub mod project;
pub mod store;
pub mod summary;
pub mod vcs;

pub use error::{Error, Result};
