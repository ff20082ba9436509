//! Delivery work item entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::notification::{ChannelKind, Notification, NotificationPriority};

use super::status::DeliveryStatus;

/// One delivery attempt unit for a (notification, channel) pair.
///
/// This is the unit the queue consumer claims and dispatches. A failed
/// item with remaining attempts always carries a `next_attempt_at`,
/// making it eligible for re-pickup; once the attempt budget is
/// exhausted it is permanently failed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeliveryItem {
    /// Unique work item identifier.
    pub id: Uuid,
    /// Parent notification.
    pub notification_id: Uuid,
    /// Target delivery channel.
    pub channel: ChannelKind,
    /// Priority inherited from the notification.
    pub priority: NotificationPriority,
    /// Current status.
    pub status: DeliveryStatus,
    /// Earliest dispatch time.
    pub scheduled_for: DateTime<Utc>,
    /// When a consumer cycle claimed the item.
    pub started_at: Option<DateTime<Utc>>,
    /// When the item reached `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of dispatch attempts so far.
    pub attempt_count: i32,
    /// Maximum allowed attempts.
    pub max_attempts: i32,
    /// When a failed item becomes claimable again.
    pub next_attempt_at: Option<DateTime<Utc>>,
    /// Last dispatch error.
    pub error_message: Option<String>,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl DeliveryItem {
    /// Build a pending work item for one channel of a notification.
    pub fn enqueue(
        notification: &Notification,
        channel: ChannelKind,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            notification_id: notification.id,
            channel,
            priority: notification.priority,
            status: DeliveryStatus::Pending,
            scheduled_for: now,
            started_at: None,
            completed_at: None,
            attempt_count: 0,
            max_attempts,
            next_attempt_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the item has attempts left after a failure.
    pub fn can_retry(&self) -> bool {
        self.status.can_retry() && self.attempt_count < self.max_attempts
    }

    /// Check if the item qualifies for claiming at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            DeliveryStatus::Pending => self.scheduled_for <= now,
            DeliveryStatus::Failed => {
                self.attempt_count < self.max_attempts
                    && self.next_attempt_at.map(|at| at <= now).unwrap_or(false)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NewNotification, NotificationKind};
    use chrono::Duration;

    fn item(now: DateTime<Utc>) -> DeliveryItem {
        let n = NewNotification {
            recipient_id: Uuid::new_v4(),
            organization_id: None,
            team_id: None,
            kind: NotificationKind::TeamAnnouncement,
            title: "t".to_string(),
            message: "m".to_string(),
            action_url: None,
            action_text: None,
            priority: NotificationPriority::Medium,
            channels: vec![ChannelKind::Email],
            metadata: serde_json::Value::Null,
        }
        .into_notification(now);
        DeliveryItem::enqueue(&n, ChannelKind::Email, 3, now)
    }

    #[test]
    fn test_pending_item_due_immediately() {
        let now = Utc::now();
        assert!(item(now).is_due(now));
    }

    #[test]
    fn test_failed_item_due_only_after_backoff() {
        let now = Utc::now();
        let mut it = item(now);
        it.status = DeliveryStatus::Failed;
        it.attempt_count = 1;
        it.next_attempt_at = Some(now + Duration::seconds(60));

        assert!(!it.is_due(now));
        assert!(it.is_due(now + Duration::seconds(61)));
    }

    #[test]
    fn test_exhausted_item_never_due() {
        let now = Utc::now();
        let mut it = item(now);
        it.status = DeliveryStatus::Failed;
        it.attempt_count = 3;
        it.next_attempt_at = Some(now - Duration::seconds(1));

        assert!(!it.is_due(now));
        assert!(!it.can_retry());
    }
}
