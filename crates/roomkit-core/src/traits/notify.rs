//! User-visible notification sink.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Severity of a user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational message.
    Info,
    /// Something the user should pay attention to.
    Warning,
    /// A failure the user must act on.
    Error,
}

impl Severity {
    /// Converts to string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A user-visible notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Severity level.
    pub severity: Severity,
}

impl Notification {
    /// Create an informational notification.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// Create a warning notification.
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// Fire-and-forget delivery of user-visible notifications.
///
/// Implementations must not fail loudly; delivery problems are their own
/// concern and never propagate back into the coordinator.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    /// Deliver a notification to the current user.
    async fn notify(&self, notification: Notification);
}
