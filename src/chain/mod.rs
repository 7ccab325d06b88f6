//! Ordered handler pipeline for changed-file batches.
//!
//! # Architecture
//!
//! ```text
//! ChangedFileSet
//!       |
//!   Process:      execute_cli_command -> rails -> user recipes ...
//!       |            (each claims files; the rest flows on)
//!   PostProcess:  could_not_handle_file
//!       |
//!   unclaimed remainder
//! ```
//!
//! Handlers are collected in a [`Registry`] before watching starts and
//! frozen into a [`CallbackChain`].

mod error;
mod files;
mod handler;
mod registry;

pub use error::ChainError;
pub use files::ChangedFileSet;
pub use handler::{ChainContext, FnHandler, Handler, HandlerOutcome, Phase};
pub use registry::{CallbackChain, Registry};
