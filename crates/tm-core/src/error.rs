//! Error types for tm-core
//!
//! Row-level problems never show up here: a line that cannot be classified is
//! passed through and reported as a [`Diagnostic`](crate::diagnostics::Diagnostic).
//! These errors cover the streams and collaborators around the merge.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tm-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table generator could not be started or produced unusable output
    #[error("table generator '{program}' failed: {message}")]
    Generator { program: String, message: String },

    /// The table generator exited with a failure status
    #[error("table generator '{program}' exited with {status}: {stderr}")]
    GeneratorStatus {
        program: String,
        status: String,
        stderr: String,
    },

    /// Invalid configuration file
    #[error("invalid config '{path}': {message}")]
    Config { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
