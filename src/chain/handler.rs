//! Handler trait and outcome types for the callback chain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use super::{ChainError, ChangedFileSet};
use crate::exec::Execute;
use crate::logging::LogSink;

/// The two phases of a chain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Main reactions: recipes and the execute-command handler.
    Process,
    /// Fallback and cleanup, runs on whatever `Process` left unclaimed.
    PostProcess,
}

/// What a handler did with the set it was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOutcome {
    /// Files passed on to the next handler.
    pub remaining: ChangedFileSet,
    /// Files this handler took responsibility for.
    pub claimed: Vec<String>,
}

impl HandlerOutcome {
    /// Leave the set untouched.
    pub fn pass(files: ChangedFileSet) -> Self {
        Self {
            remaining: files,
            claimed: Vec::new(),
        }
    }

    /// Claim every file, halting the chain.
    pub fn claim_all(files: ChangedFileSet) -> Self {
        Self {
            remaining: ChangedFileSet::default(),
            claimed: files.into_vec(),
        }
    }

    /// Claim the files for which `claim` returns true.
    pub fn split(files: ChangedFileSet, claim: impl FnMut(&str) -> bool) -> Self {
        let (remaining, claimed) = files.partition(claim);
        Self { remaining, claimed }
    }

    pub fn is_pass_through(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// Shared services handed to every handler call.
#[derive(Clone)]
pub struct ChainContext {
    pub executor: Arc<dyn Execute>,
    pub log: Arc<dyn LogSink>,
    /// Directory that relative paths in the set are resolved against.
    pub root: PathBuf,
}

impl ChainContext {
    pub fn new(executor: Arc<dyn Execute>, log: Arc<dyn LogSink>, root: PathBuf) -> Self {
        Self {
            executor,
            log,
            root,
        }
    }

    /// Resolve a set entry against the working directory.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// A named step in the callback chain.
///
/// Handlers receive the current working set by value and hand back the
/// part they did not claim.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &str;

    async fn call(
        &self,
        files: ChangedFileSet,
        ctx: &ChainContext,
    ) -> Result<HandlerOutcome, ChainError>;
}

/// Adapter turning a plain function into a [`Handler`].
///
/// Useful for instrumentation hooks that observe changes without claiming:
///
/// ```ignore
/// registry.register(Phase::Process, FnHandler::new("trace", |files, _ctx| {
///     tracing::debug!("changed: {}", files.len());
///     Ok(HandlerOutcome::pass(files))
/// }));
/// ```
pub struct FnHandler<F> {
    name: String,
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(ChangedFileSet, &ChainContext) -> Result<HandlerOutcome, ChainError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: Fn(ChangedFileSet, &ChainContext) -> Result<HandlerOutcome, ChainError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        files: ChangedFileSet,
        ctx: &ChainContext,
    ) -> Result<HandlerOutcome, ChainError> {
        (self.func)(files, ctx)
    }
}
