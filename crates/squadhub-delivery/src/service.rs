//! Notification intake — the creation API feature code calls.

use std::sync::Arc;

use tracing::info;

use squadhub_core::config::worker::WorkerConfig;
use squadhub_core::result::AppResult;
use squadhub_core::traits::clock::Clock;
use squadhub_database::store::{DeliveryStore, NotificationStore};
use squadhub_entity::delivery::DeliveryItem;
use squadhub_entity::notification::{NewNotification, Notification, NotificationPriority};

/// Persists notifications and enqueues one delivery work item per
/// configured channel. This is the only producer of work items.
#[derive(Debug)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationStore>,
    delivery: Arc<dyn DeliveryStore>,
    clock: Arc<dyn Clock>,
    default_max_attempts: i32,
    urgent_max_attempts: i32,
}

impl NotificationService {
    /// Create a new notification service.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        delivery: Arc<dyn DeliveryStore>,
        clock: Arc<dyn Clock>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            notifications,
            delivery,
            clock,
            default_max_attempts: config.default_max_attempts,
            urgent_max_attempts: config.urgent_max_attempts,
        }
    }

    /// Create a notification and enqueue its per-channel work items.
    ///
    /// Urgent notifications get the extended attempt budget.
    pub async fn create(&self, new: NewNotification) -> AppResult<Notification> {
        let now = self.clock.now();
        let notification = new.into_notification(now);

        self.notifications.create(&notification).await?;

        let max_attempts = if notification.priority == NotificationPriority::Urgent {
            self.urgent_max_attempts
        } else {
            self.default_max_attempts
        };

        for channel in notification.channels.0.iter() {
            let item = DeliveryItem::enqueue(&notification, *channel, max_attempts, now);
            self.delivery.enqueue(&item).await?;
        }

        info!(
            "Created notification {} ({}) for {} on {} channel(s)",
            notification.id,
            notification.kind,
            notification.recipient_id,
            notification.channels.0.len()
        );
        Ok(notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use squadhub_core::traits::clock::ManualClock;
    use squadhub_entity::notification::{ChannelKind, NotificationKind};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Debug, Default)]
    struct RecordingNotifications {
        created: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationStore for RecordingNotifications {
        async fn create(&self, notification: &Notification) -> AppResult<()> {
            self.created.lock().unwrap().push(notification.clone());
            Ok(())
        }

        async fn find_by_id(&self, _id: Uuid) -> AppResult<Option<Notification>> {
            Ok(None)
        }

        async fn mark_sent(&self, _id: Uuid, _at: DateTime<Utc>) -> AppResult<()> {
            Ok(())
        }

        async fn mark_failed(&self, _id: Uuid, _error: &str) -> AppResult<()> {
            Ok(())
        }

        async fn list_digest_candidates(
            &self,
            _cutoff: DateTime<Utc>,
        ) -> AppResult<Vec<Notification>> {
            Ok(Vec::new())
        }

        async fn mark_digest_sent(&self, _ids: &[Uuid]) -> AppResult<u64> {
            Ok(0)
        }
    }

    #[derive(Debug, Default)]
    struct RecordingDelivery {
        enqueued: Mutex<Vec<DeliveryItem>>,
    }

    #[async_trait]
    impl DeliveryStore for RecordingDelivery {
        async fn enqueue(&self, item: &DeliveryItem) -> AppResult<()> {
            self.enqueued.lock().unwrap().push(item.clone());
            Ok(())
        }

        async fn claim_due(
            &self,
            _now: DateTime<Utc>,
            _limit: i64,
        ) -> AppResult<Vec<DeliveryItem>> {
            Ok(Vec::new())
        }

        async fn mark_completed(&self, _id: Uuid, _at: DateTime<Utc>) -> AppResult<()> {
            Ok(())
        }

        async fn mark_retry(
            &self,
            _id: Uuid,
            _next_attempt_at: DateTime<Utc>,
            _error: &str,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn mark_failed(&self, _id: Uuid, _error: &str) -> AppResult<()> {
            Ok(())
        }
    }

    fn service(
        notifications: Arc<RecordingNotifications>,
        delivery: Arc<RecordingDelivery>,
    ) -> NotificationService {
        NotificationService::new(
            notifications,
            delivery,
            Arc::new(ManualClock::starting_at(Utc::now())),
            &WorkerConfig::default(),
        )
    }

    fn new_notification(priority: NotificationPriority, channels: Vec<ChannelKind>) -> NewNotification {
        NewNotification {
            recipient_id: Uuid::new_v4(),
            organization_id: None,
            team_id: None,
            kind: NotificationKind::ScheduleChange,
            title: "t".to_string(),
            message: "m".to_string(),
            action_url: None,
            action_text: None,
            priority,
            channels,
            metadata: serde_json::Value::Null,
        }
    }

    #[tokio::test]
    async fn test_one_work_item_per_channel() {
        let notifications = Arc::new(RecordingNotifications::default());
        let delivery = Arc::new(RecordingDelivery::default());
        let service = service(Arc::clone(&notifications), Arc::clone(&delivery));

        let created = service
            .create(new_notification(
                NotificationPriority::High,
                vec![ChannelKind::InApp, ChannelKind::Email, ChannelKind::Push],
            ))
            .await
            .unwrap();

        let items = delivery.enqueued.lock().unwrap();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| i.notification_id == created.id));
        assert!(items.iter().all(|i| i.max_attempts == 3));
        assert!(items.iter().all(|i| i.priority == NotificationPriority::High));
    }

    #[tokio::test]
    async fn test_urgent_notification_gets_extended_budget() {
        let notifications = Arc::new(RecordingNotifications::default());
        let delivery = Arc::new(RecordingDelivery::default());
        let service = service(notifications, Arc::clone(&delivery));

        service
            .create(new_notification(
                NotificationPriority::Urgent,
                vec![ChannelKind::Email],
            ))
            .await
            .unwrap();

        let items = delivery.enqueued.lock().unwrap();
        assert_eq!(items[0].max_attempts, 5);
    }
}
