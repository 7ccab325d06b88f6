//! Shell command execution with logging and notifications.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use super::notifier::{ClickAction, Notification, NotificationKind, Notifier};
use crate::logging::LogSink;

/// Outcome of one command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Combined stdout and stderr.
    pub output: String,
    pub success: bool,
    /// Exit status; `-1` when the command could not be launched or was
    /// killed by a signal.
    pub status: i32,
}

impl ExecutionResult {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
            status: 0,
        }
    }

    pub fn failed(output: impl Into<String>, status: i32) -> Self {
        Self {
            output: output.into(),
            success: false,
            status,
        }
    }
}

/// Something that can run a shell command.
///
/// A failed command is a normal result, never an error.
#[async_trait]
pub trait Execute: Send + Sync {
    async fn execute(&self, command: &str) -> ExecutionResult;
}

/// Runs commands through `sh -c`, logging output and firing notifications.
pub struct CommandExecutor {
    log: Arc<dyn LogSink>,
    notifier: Option<Arc<dyn Notifier>>,
    /// Click command for success notifications.
    click_command: Option<String>,
    shell: String,
}

impl CommandExecutor {
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self {
            log,
            notifier: None,
            click_command: None,
            shell: "sh".to_string(),
        }
    }

    /// Enable notifications through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Command run when a success notification is clicked.
    pub fn with_click_command(mut self, command: Option<String>) -> Self {
        self.click_command = command;
        self
    }

    /// Override the shell binary (defaults to `sh`).
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    async fn run(&self, command: &str) -> ExecutionResult {
        // stderr joins stdout so lines stay interleaved.
        let script = format!("exec 2>&1\n{command}");

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).to_string();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                if output.status.success() {
                    ExecutionResult::succeeded(text)
                } else {
                    ExecutionResult::failed(text, output.status.code().unwrap_or(-1))
                }
            }
            Err(e) => ExecutionResult::failed(format!("failed to launch {}: {e}", self.shell), -1),
        }
    }

    fn notify(&self, kind: NotificationKind, title: String, body: String, on_click: ClickAction) {
        if let Some(notifier) = &self.notifier {
            notifier.notify(Notification {
                kind,
                title,
                body,
                on_click,
            });
        }
    }
}

#[async_trait]
impl Execute for CommandExecutor {
    async fn execute(&self, command: &str) -> ExecutionResult {
        self.log
            .log(&format!("Change occured, executing command: {command}"));
        self.notify(
            NotificationKind::Change,
            "Kicker:".to_string(),
            "Change occured, executing command...".to_string(),
            ClickAction::FocusTerminal,
        );

        let result = self.run(command).await;

        for line in result.output.trim().lines() {
            self.log.log(&format!("  {line}"));
        }

        if result.success {
            self.log.log("Command succeeded");
            let on_click = self
                .click_command
                .clone()
                .map(ClickAction::RunCommand)
                .unwrap_or(ClickAction::FocusTerminal);
            self.notify(
                NotificationKind::Succeeded,
                "Kicker: Command succeeded".to_string(),
                result.output.clone(),
                on_click,
            );
        } else {
            self.log
                .log(&format!("Command failed ({})", result.status));
            self.notify(
                NotificationKind::Failed,
                format!("Kicker: Command failed ({})", result.status),
                result.output.clone(),
                ClickAction::FocusTerminal,
            );
        }

        result
    }
}
