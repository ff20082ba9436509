//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::channel::ChannelKind;
use super::kind::NotificationKind;
use super::priority::NotificationPriority;
use super::status::NotificationStatus;

/// One logical event to deliver to a recipient, independent of channel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient user.
    pub recipient_id: Uuid,
    /// Owning organization, if scoped.
    pub organization_id: Option<Uuid>,
    /// Owning team, if scoped.
    pub team_id: Option<Uuid>,
    /// Event kind that produced this notification.
    pub kind: NotificationKind,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub message: String,
    /// Optional call-to-action URL.
    pub action_url: Option<String>,
    /// Optional call-to-action label.
    pub action_text: Option<String>,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Channels chosen at creation time.
    pub channels: Json<Vec<ChannelKind>>,
    /// Delivery lifecycle status.
    pub status: NotificationStatus,
    /// Last delivery error, if any.
    pub error_message: Option<String>,
    /// Opaque key/value bag. Carries `digest_sent` once a digest email
    /// has included this notification.
    pub metadata: serde_json::Value,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the first channel delivery succeeded. Set at most once.
    pub sent_at: Option<DateTime<Utc>>,
    /// When delivery to a device was confirmed. Set at most once.
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the recipient read the notification. Set at most once.
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Check if the notification has been read.
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }

    /// Check if a digest email already included this notification.
    pub fn digest_sent(&self) -> bool {
        self.metadata
            .get("digest_sent")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Check if the notification targets the given channel.
    pub fn has_channel(&self, channel: ChannelKind) -> bool {
        self.channels.0.contains(&channel)
    }
}

/// Data required to create a new notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    /// The recipient user.
    pub recipient_id: Uuid,
    /// Owning organization, if scoped.
    pub organization_id: Option<Uuid>,
    /// Owning team, if scoped.
    pub team_id: Option<Uuid>,
    /// Event kind.
    pub kind: NotificationKind,
    /// Title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Optional call-to-action URL.
    pub action_url: Option<String>,
    /// Optional call-to-action label.
    pub action_text: Option<String>,
    /// Priority level.
    pub priority: NotificationPriority,
    /// Channels to deliver on.
    pub channels: Vec<ChannelKind>,
    /// Opaque metadata bag.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl NewNotification {
    /// Materialize a persistable notification, stamping id and creation time.
    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        let mut channels = self.channels;
        // Medical alerts always reach the offline channels.
        if self.kind.is_medical() {
            for forced in [ChannelKind::Email, ChannelKind::Push] {
                if !channels.contains(&forced) {
                    channels.push(forced);
                }
            }
        }

        Notification {
            id: Uuid::new_v4(),
            recipient_id: self.recipient_id,
            organization_id: self.organization_id,
            team_id: self.team_id,
            kind: self.kind,
            title: self.title,
            message: self.message,
            action_url: self.action_url,
            action_text: self.action_text,
            priority: self.priority,
            channels: Json(channels),
            status: NotificationStatus::Pending,
            error_message: None,
            metadata: self.metadata,
            created_at: now,
            sent_at: None,
            delivered_at: None,
            read_at: None,
        }
    }
}
