//! Error types for chain handlers.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running the callback chain.
///
/// Any of these aborts the current batch. The orchestrator logs it and
/// keeps watching.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Handler '{handler}' failed: {reason}")]
    HandlerFailed { handler: String, reason: String },

    #[error("Invalid glob '{pattern}': {reason}")]
    Glob { pattern: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ChainError {
    /// Convenience constructor for handler-specific failures.
    pub fn handler(handler: impl Into<String>, reason: impl ToString) -> Self {
        ChainError::HandlerFailed {
            handler: handler.into(),
            reason: reason.to_string(),
        }
    }
}
