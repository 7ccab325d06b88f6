//! Fallback handler reporting files no recipe claimed.

use async_trait::async_trait;

use crate::chain::{ChainContext, ChainError, ChangedFileSet, Handler, HandlerOutcome};

/// Logs whatever is left after the `Process` phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct CouldNotHandle;

#[async_trait]
impl Handler for CouldNotHandle {
    fn name(&self) -> &str {
        "could_not_handle_file"
    }

    async fn call(
        &self,
        files: ChangedFileSet,
        ctx: &ChainContext,
    ) -> Result<HandlerOutcome, ChainError> {
        if !files.is_empty() {
            let list: Vec<&str> = files.iter().collect();
            ctx.log.log("");
            ctx.log.log(&format!("Could not handle: {}", list.join(", ")));
            ctx.log.log("");
        }
        Ok(HandlerOutcome::pass(files))
    }
}
