//! In-app channel sender — real-time fan-out to the recipient's room.

use std::sync::Arc;

use async_trait::async_trait;

use squadhub_core::traits::realtime::RealtimePublisher;
use squadhub_entity::notification::{ChannelKind, Notification};

use super::{ChannelSender, DeliveryOutcome, DispatchError};

/// Publishes the notification envelope to `user:<recipient_id>`.
///
/// Delivery is fire-and-forget; the transport's own at-most-once
/// semantics apply and there is no acknowledgement step.
#[derive(Debug)]
pub struct InAppSender {
    publisher: Option<Arc<dyn RealtimePublisher>>,
}

impl InAppSender {
    /// Create a sender. `None` means no real-time transport is wired in;
    /// every dispatch then fails with a configuration error.
    pub fn new(publisher: Option<Arc<dyn RealtimePublisher>>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> ChannelKind {
        ChannelKind::InApp
    }

    async fn deliver(&self, notification: &Notification) -> Result<DeliveryOutcome, DispatchError> {
        let publisher = self.publisher.as_ref().ok_or_else(|| {
            DispatchError::Configuration("real-time channel not available".to_string())
        })?;

        let envelope = serde_json::json!({
            "id": notification.id,
            "kind": notification.kind,
            "title": notification.title,
            "message": notification.message,
            "priority": notification.priority,
            "action_url": notification.action_url,
            "action_text": notification.action_text,
            "created_at": notification.created_at,
            "metadata": notification.metadata,
        });

        let room = format!("user:{}", notification.recipient_id);
        publisher
            .publish(&room, "notification", envelope)
            .await
            .map_err(|e| DispatchError::Transient(format!("realtime publish failed: {e}")))?;

        Ok(DeliveryOutcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use squadhub_core::result::AppResult;
    use squadhub_entity::notification::{NewNotification, NotificationKind, NotificationPriority};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Debug, Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, String, serde_json::Value)>>,
    }

    #[async_trait]
    impl RealtimePublisher for RecordingPublisher {
        async fn publish(
            &self,
            room: &str,
            event: &str,
            payload: serde_json::Value,
        ) -> AppResult<()> {
            self.published.lock().unwrap().push((
                room.to_string(),
                event.to_string(),
                payload,
            ));
            Ok(())
        }
    }

    fn notification() -> Notification {
        NewNotification {
            recipient_id: Uuid::new_v4(),
            organization_id: None,
            team_id: None,
            kind: NotificationKind::MessageReceived,
            title: "New message".to_string(),
            message: "Coach: see you at 6".to_string(),
            action_url: None,
            action_text: None,
            priority: NotificationPriority::Medium,
            channels: vec![ChannelKind::InApp],
            metadata: serde_json::Value::Null,
        }
        .into_notification(Utc::now())
    }

    #[tokio::test]
    async fn test_publishes_to_recipient_room() {
        let publisher = Arc::new(RecordingPublisher::default());
        let sender = InAppSender::new(Some(Arc::clone(&publisher) as Arc<dyn RealtimePublisher>));
        let n = notification();

        let outcome = sender.deliver(&n).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered);

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, format!("user:{}", n.recipient_id));
        assert_eq!(published[0].1, "notification");
        assert_eq!(published[0].2["title"], "New message");
    }

    #[tokio::test]
    async fn test_missing_transport_is_configuration_error() {
        let sender = InAppSender::new(None);
        let err = sender.deliver(&notification()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
    }
}
