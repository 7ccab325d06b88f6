//! In-memory fakes for the executor, log and notifier seams (testing only)
//!
//! Provides `RecordingLog`, `RecordingExecutor`, and `RecordingNotifier`
//! that capture what the chain asked for without touching the shell or the
//! desktop.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::exec::{Execute, ExecutionResult, Notification, NotificationKind, Notifier};
use crate::logging::LogSink;

// ---------------------------------------------------------------------------
// RecordingLog
// ---------------------------------------------------------------------------

/// Log sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl LogSink for RecordingLog {
    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// RecordingExecutor
// ---------------------------------------------------------------------------

/// Executor that records commands instead of running them.
#[derive(Debug)]
pub struct RecordingExecutor {
    commands: Mutex<Vec<String>>,
    result: ExecutionResult,
}

impl RecordingExecutor {
    /// Every command "succeeds" with empty output.
    pub fn new() -> Self {
        Self::returning(ExecutionResult::succeeded(""))
    }

    pub fn returning(result: ExecutionResult) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            result,
        }
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }
}

impl Default for RecordingExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Execute for RecordingExecutor {
    async fn execute(&self, command: &str) -> ExecutionResult {
        self.commands.lock().push(command.to_string());
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Notifier that keeps registrations and notifications in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    registrations: Mutex<Vec<(String, Vec<NotificationKind>)>>,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> Vec<(String, Vec<NotificationKind>)> {
        self.registrations.lock().clone()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn register(&self, app_name: &str, kinds: &[NotificationKind]) {
        self.registrations
            .lock()
            .push((app_name.to_string(), kinds.to_vec()));
    }

    fn notify(&self, notification: Notification) {
        self.sent.lock().push(notification);
    }
}
