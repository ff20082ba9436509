//! Notification status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a notification.
///
/// Status only advances forward (pending → sent → delivered → read)
/// except for the failed↔retry loop driven by the queue consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Created, not yet delivered on any channel.
    Pending,
    /// At least one channel delivery succeeded.
    Sent,
    /// Confirmed delivered to the recipient's device.
    Delivered,
    /// The recipient opened the notification.
    Read,
    /// All channel deliveries exhausted their attempt budget.
    Failed,
}

impl NotificationStatus {
    /// Check if the status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Read | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
