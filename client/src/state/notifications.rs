//! Fire-and-forget user notifications (toasts).
//!
//! Producers call [`Notifier::notify`] and move on; the renderer drains the
//! queue whenever it wakes. A message already waiting is not queued twice.

#[cfg(test)]
#[path = "notifications_test.rs"]
mod notifications_test;

use std::time::Duration;

use super::store::Store;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// How long the renderer keeps the toast visible.
    #[must_use]
    pub fn default_duration(self) -> Duration {
        match self {
            Self::Error => Duration::from_millis(5000),
            Self::Success | Self::Warning | Self::Info => Duration::from_millis(4000),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub duration: Duration,
}

/// Sink for user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify_for(&self, severity: Severity, message: &str, duration: Duration);

    fn notify(&self, severity: Severity, message: &str) {
        self.notify_for(severity, message, severity.default_duration());
    }

    fn success(&self, message: &str) {
        self.notify(Severity::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }

    fn warning(&self, message: &str) {
        self.notify(Severity::Warning, message);
    }

    fn info(&self, message: &str) {
        self.notify(Severity::Info, message);
    }
}

/// Pending notifications, oldest first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotificationsState {
    pub pending: Vec<Notification>,
}

#[derive(Clone, Default)]
pub struct NotificationCenter {
    state: Store<NotificationsState>,
}

impl NotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &Store<NotificationsState> {
        &self.state
    }

    /// Take everything queued so far.
    pub fn drain(&self) -> Vec<Notification> {
        let mut drained = Vec::new();
        self.state.update(|s| drained = std::mem::take(&mut s.pending));
        drained
    }
}

impl Notifier for NotificationCenter {
    fn notify_for(&self, severity: Severity, message: &str, duration: Duration) {
        tracing::debug!(severity = severity.as_str(), message, "notification");
        self.state.update(|s| {
            if s.pending.iter().any(|n| n.message == message) {
                return;
            }
            s.pending.push(Notification { severity, message: message.to_owned(), duration });
        });
    }
}
