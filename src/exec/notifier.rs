//! Desktop notification sink.
//!
//! Notifications carry a [`ClickAction`] value instead of a callback; the
//! sink decides at display time how (or whether) a click can be honored.

use std::collections::HashSet;

use parking_lot::RwLock;
use tokio::process::Command;

/// Application name notifications are registered under.
pub const APP_NAME: &str = "Kicker";

/// Kinds of notification the executor emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Change,
    Succeeded,
    Failed,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 3] = [
        NotificationKind::Change,
        NotificationKind::Succeeded,
        NotificationKind::Failed,
    ];

    /// Human-readable kind name, as shown in notification preferences.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationKind::Change => "Change occured",
            NotificationKind::Succeeded => "Command succeeded",
            NotificationKind::Failed => "Command failed",
        }
    }
}

/// What clicking a notification should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Bring the terminal to the foreground.
    FocusTerminal,
    /// Run a user-supplied shell command.
    RunCommand(String),
}

impl ClickAction {
    /// Shell command that performs this action.
    pub fn shell_command(&self) -> String {
        match self {
            ClickAction::FocusTerminal => {
                "osascript -e 'tell application \"Terminal\" to activate'".to_string()
            }
            ClickAction::RunCommand(command) => command.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub on_click: ClickAction,
}

/// Notification sink.
///
/// Delivery is best-effort: failures are logged, never returned.
pub trait Notifier: Send + Sync {
    /// Announce the application and the kinds it will send.
    fn register(&self, app_name: &str, kinds: &[NotificationKind]);

    fn notify(&self, notification: Notification);
}

/// Shells out to the platform notifier.
///
/// macOS uses `terminal-notifier`, which honors click actions through
/// `-execute`. Other platforms use `notify-send`; clicks are ignored there.
#[derive(Debug, Default)]
pub struct DesktopNotifier {
    app_name: RwLock<Option<String>>,
    kinds: RwLock<HashSet<NotificationKind>>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn command_for(&self, app_name: &str, notification: &Notification) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("terminal-notifier");
            cmd.arg("-group")
                .arg(app_name)
                .arg("-title")
                .arg(&notification.title)
                .arg("-message")
                .arg(&notification.body)
                .arg("-execute")
                .arg(notification.on_click.shell_command());
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.arg(format!("--app-name={app_name}"))
                .arg(&notification.title)
                .arg(&notification.body);
            cmd
        }
    }
}

impl Notifier for DesktopNotifier {
    fn register(&self, app_name: &str, kinds: &[NotificationKind]) {
        *self.app_name.write() = Some(app_name.to_string());
        self.kinds.write().extend(kinds.iter().copied());

        let labels: Vec<&str> = kinds.iter().map(|k| k.label()).collect();
        crate::debug_event!("notify", "registered", "{app_name}: {}", labels.join(", "));
    }

    fn notify(&self, notification: Notification) {
        if !self.kinds.read().contains(&notification.kind) {
            crate::debug_event!("notify", "unregistered kind", "{:?}", notification.kind);
            return;
        }

        let app_name = self
            .app_name
            .read()
            .clone()
            .unwrap_or_else(|| APP_NAME.to_string());

        // Spawned children that are never awaited are reaped by tokio.
        match self.command_for(&app_name, &notification).spawn() {
            Ok(_child) => {
                crate::debug_event!("notify", "sent", "{}", notification.title);
            }
            Err(e) => {
                tracing::debug!("[notify] failed to send notification: {e}");
            }
        }
    }
}
