use console::{style, Emoji};
use std::fmt;
use tracing::{error, info};

static CHECKMARK: Emoji<'_, '_> = Emoji("✅ ", "");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Error => write!(f, "error"),
        }
    }
}

/// Fire-and-forget message display.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);
}

/// Prints notifications to the terminal and mirrors them into the log.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success => {
                println!("{} {}", CHECKMARK, style(message).green());
                info!("Notification ({}): {}", kind, message);
            }
            NotificationKind::Error => {
                println!("{} {}", CROSS, style(message).red());
                error!("Notification ({}): {}", kind, message);
            }
        }
    }
}
