//! Error types for the watcher.

use std::path::PathBuf;
use thiserror::Error;

use crate::chain::ChainError;

/// Errors from watcher operations.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("Cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("Cannot read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}

/// Problems that stop the watcher from starting.
#[derive(Error, Debug)]
pub enum StartError {
    #[error("The given path `{}' does not exist", .0.display())]
    MissingPath(PathBuf),

    #[error("No commands or recipes to run on change")]
    NoHandlers,
}
