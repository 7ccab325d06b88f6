//! Handler running a fixed command on any change.

use async_trait::async_trait;

use crate::chain::{ChainContext, ChainError, ChangedFileSet, Handler, HandlerOutcome};

/// Runs `command` whenever anything changed and claims every file.
///
/// Registered once per `-e/--execute` flag.
#[derive(Debug, Clone)]
pub struct ExecuteCommand {
    command: String,
}

impl ExecuteCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Handler for ExecuteCommand {
    fn name(&self) -> &str {
        "execute_cli_command"
    }

    async fn call(
        &self,
        files: ChangedFileSet,
        ctx: &ChainContext,
    ) -> Result<HandlerOutcome, ChainError> {
        ctx.executor.execute(&self.command).await;
        Ok(HandlerOutcome::claim_all(files))
    }
}
