//! Command execution and outcome notifications.

mod executor;
mod notifier;

pub use executor::{CommandExecutor, Execute, ExecutionResult};
pub use notifier::{
    APP_NAME, ClickAction, DesktopNotifier, Notification, NotificationKind, Notifier,
};
