//! Error types shared by the stores, hooks and project operations.

use thiserror::Error;

use crate::vcs::VcsError;

/// Errors surfaced by harness operations.
///
/// Every error is local to the operation that produced it. Nothing is
/// retried and nothing is rolled back, because a store write either
/// replaces the whole document or leaves the previous one in place.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad caller input, such as an empty feature name.
    #[error("{0}")]
    Validation(String),

    #[error("Feature {0} not found")]
    NotFound(u64),

    /// The persisted store could not be read or written.
    #[error("Failed to access {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// The persisted store exists but does not hold valid data.
    #[error("Malformed data in {location}: {reason}")]
    Malformed { location: String, reason: String },

    /// The harness configuration could not be written.
    #[error("Failed to write config {location}: {reason}")]
    Config { location: String, reason: String },

    #[error(transparent)]
    Vcs(#[from] VcsError),
}

pub type Result<T> = std::result::Result<T, Error>;
