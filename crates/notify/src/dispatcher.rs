//! Notification dispatcher trait and implementations

use std::sync::Mutex;
use thiserror::Error;

use crate::message::Notification;

/// Errors from a dispatcher backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Notification Dispatcher - the transport boundary.
///
/// Real deployments plug an SMS/mail gateway in here; tests use
/// `MemoryDispatcher`.
pub trait NotificationDispatcher: Send + Sync {
    /// Dispatcher name, used in log lines
    fn name(&self) -> &str;

    /// Deliver a single notification
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Send a notification without letting delivery problems escape.
///
/// Settlement outcomes must never depend on the messaging gateway, so
/// failures are logged at WARN and swallowed.
pub fn dispatch_or_log(dispatcher: &dyn NotificationDispatcher, notification: Notification) {
    match dispatcher.send(&notification) {
        Ok(()) => {
            tracing::debug!(
                dispatcher = dispatcher.name(),
                channel = notification.channel.as_str(),
                to = %notification.to,
                "Notification delivered"
            );
        }
        Err(e) => {
            tracing::warn!(
                dispatcher = dispatcher.name(),
                channel = notification.channel.as_str(),
                to = %notification.to,
                error = %e,
                "Notification delivery failed, continuing"
            );
        }
    }
}

/// In-memory dispatcher that records every notification (for tests).
pub struct MemoryDispatcher {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl MemoryDispatcher {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A dispatcher whose every delivery fails (for fire-and-forget tests)
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Notifications recorded so far
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("dispatcher lock poisoned").clone()
    }
}

impl Default for MemoryDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationDispatcher for MemoryDispatcher {
    fn name(&self) -> &str {
        "memory"
    }

    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::DeliveryFailed("configured to fail".into()));
        }
        self.sent
            .lock()
            .expect("dispatcher lock poisoned")
            .push(notification.clone());
        Ok(())
    }
}
