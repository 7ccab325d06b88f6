//! Kicker: watch files and run commands or recipes when they change.

pub mod chain;
pub mod cli;
pub mod config;
pub mod exec;
pub mod fakes;
pub mod logging;
pub mod recipes;
pub mod watcher;

pub use chain::{CallbackChain, ChainContext, ChangedFileSet, Handler, HandlerOutcome, Phase, Registry};
pub use config::Settings;
pub use exec::{CommandExecutor, Execute, ExecutionResult};
pub use recipes::{Recipe, RecipeError, Rule, build_registry};
pub use watcher::{Kicker, StartError, WatchError};
