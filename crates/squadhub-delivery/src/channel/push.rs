//! Push channel sender — Web Push fan-out across a user's registered
//! subscriptions.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use squadhub_core::traits::clock::Clock;
use squadhub_core::traits::push::{PushOptions, PushSendError, PushUrgency, WebPushSender};
use squadhub_database::store::PushSubscriptionStore;
use squadhub_entity::notification::{ChannelKind, Notification, NotificationPriority};
use squadhub_entity::push::PushSubscription;

use super::{ChannelSender, DeliveryOutcome, DispatchError};

/// Fans one notification out to every active subscription of the
/// recipient. One dead endpoint never fails the whole fan-out: 404/410
/// responses deactivate that subscription and the rest proceed. Partial
/// success is overall success; only a fan-out with zero deliveries is a
/// retryable failure.
#[derive(Debug)]
pub struct PushChannelSender {
    oracle: Arc<crate::presence::PresenceOracle>,
    subscriptions: Arc<dyn PushSubscriptionStore>,
    sender: Arc<dyn WebPushSender>,
    clock: Arc<dyn Clock>,
    ttl_seconds: u32,
    fanout_concurrency: usize,
}

impl PushChannelSender {
    /// Create a new push channel sender.
    pub fn new(
        oracle: Arc<crate::presence::PresenceOracle>,
        subscriptions: Arc<dyn PushSubscriptionStore>,
        sender: Arc<dyn WebPushSender>,
        clock: Arc<dyn Clock>,
        ttl_seconds: u32,
        fanout_concurrency: usize,
    ) -> Self {
        Self {
            oracle,
            subscriptions,
            sender,
            clock,
            ttl_seconds,
            fanout_concurrency: fanout_concurrency.max(1),
        }
    }

    /// Attempt one subscription. Returns `true` on success.
    async fn send_to_subscription(
        &self,
        subscription: &PushSubscription,
        payload: &str,
        options: &PushOptions,
    ) -> bool {
        match self
            .sender
            .send(&subscription.as_target(), payload, options)
            .await
        {
            Ok(()) => {
                if let Err(e) = self
                    .subscriptions
                    .touch(subscription.id, self.clock.now())
                    .await
                {
                    warn!(
                        "Failed to record delivery on subscription {}: {e}",
                        subscription.id
                    );
                }
                true
            }
            Err(PushSendError::EndpointGone { status }) => {
                warn!(
                    "Push endpoint gone (HTTP {status}), deactivating subscription {}",
                    subscription.id
                );
                if let Err(e) = self.subscriptions.deactivate(subscription.id).await {
                    warn!("Failed to deactivate subscription {}: {e}", subscription.id);
                }
                false
            }
            Err(PushSendError::Transport(msg)) => {
                warn!(
                    "Push send to subscription {} failed: {msg}",
                    subscription.id
                );
                false
            }
        }
    }
}

#[async_trait]
impl ChannelSender for PushChannelSender {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Push
    }

    async fn deliver(&self, notification: &Notification) -> Result<DeliveryOutcome, DispatchError> {
        let offline = self
            .oracle
            .is_offline(notification.recipient_id)
            .await
            .map_err(|e| DispatchError::Transient(format!("presence lookup failed: {e}")))?;

        if !offline {
            debug!(
                "Recipient {} is reachable in-app, skipping push for {}",
                notification.recipient_id, notification.id
            );
            return Ok(DeliveryOutcome::Suppressed);
        }

        let subscriptions = self
            .subscriptions
            .find_active_by_user(notification.recipient_id)
            .await
            .map_err(|e| DispatchError::Transient(format!("subscription lookup failed: {e}")))?;

        if subscriptions.is_empty() {
            debug!(
                "No active push subscriptions for {}, nothing to send for {}",
                notification.recipient_id, notification.id
            );
            return Ok(DeliveryOutcome::NoDestination);
        }

        let payload = serde_json::json!({
            "id": notification.id,
            "kind": notification.kind,
            "title": notification.title,
            "message": notification.message,
            "priority": notification.priority,
            "action_url": notification.action_url,
            "tag": notification.kind.as_str(),
        })
        .to_string();

        let options = PushOptions {
            ttl_seconds: self.ttl_seconds,
            urgency: if notification.priority == NotificationPriority::Urgent {
                PushUrgency::High
            } else {
                PushUrgency::Normal
            },
            topic: Some(notification.kind.as_str().to_string()),
        };

        let payload_ref = &payload;
        let options_ref = &options;
        let results: Vec<bool> = stream::iter(subscriptions.into_iter())
            .map(|subscription| async move {
                self.send_to_subscription(&subscription, payload_ref, options_ref)
                    .await
            })
            .buffer_unordered(self.fanout_concurrency)
            .collect()
            .await;

        let sent = results.iter().filter(|ok| **ok).count();
        let failed = results.len() - sent;

        if sent == 0 && failed > 0 {
            return Err(DispatchError::Transient(format!(
                "all {failed} push sends failed for {}",
                notification.id
            )));
        }

        debug!(
            "Push fan-out for {} finished: sent={sent}, failed={failed}",
            notification.id
        );
        Ok(DeliveryOutcome::PartialPush { sent, failed })
    }
}
