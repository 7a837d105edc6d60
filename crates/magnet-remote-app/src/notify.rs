//! User-visible notifications about submission results.

use std::io::{self, Write};

use magnet_remote_config::ProtocolKind;
use tracing::{error, info};

const SENT_TITLE: &str = "Magnet Sent";
const FAILED_TITLE: &str = "Failed to Send";
const APP_TITLE: &str = "Magnet Remote";
const NOT_CONFIGURED_BODY: &str = "No server configured. Open Settings to set up.";

/// Whether a notification reports success or a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational.
    Info,
    /// Something went wrong.
    Error,
}

/// Title and body handed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short headline.
    pub title: String,
    /// Detail line.
    pub body: String,
    /// Success or failure.
    pub severity: Severity,
}

impl Notification {
    /// Magnet accepted by the daemon.
    #[must_use]
    pub fn sent(protocol: ProtocolKind) -> Self {
        Self {
            title: SENT_TITLE.to_string(),
            body: format!("Sent to {}", protocol.display_name()),
            severity: Severity::Info,
        }
    }

    /// Submission failed with a user-facing message.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            title: FAILED_TITLE.to_string(),
            body: message.into(),
            severity: Severity::Error,
        }
    }

    /// No daemon has been configured yet.
    #[must_use]
    pub fn not_configured() -> Self {
        Self {
            title: APP_TITLE.to_string(),
            body: NOT_CONFIGURED_BODY.to_string(),
            severity: Severity::Error,
        }
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    /// Present `notification` to the user.
    fn notify(&self, notification: &Notification);
}

/// Emits notifications as log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.severity {
            Severity::Info => info!(title = %notification.title, "{}", notification.body),
            Severity::Error => error!(title = %notification.title, "{}", notification.body),
        }
    }
}

/// Writes notifications to standard error for terminal use.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notification: &Notification) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}: {}", notification.title, notification.body);
    }
}
