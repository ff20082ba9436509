//! Delivery queue consumer — polls due work items and dispatches them.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

use squadhub_core::config::worker::WorkerConfig;
use squadhub_core::traits::clock::Clock;
use squadhub_database::store::{DeliveryStore, NotificationStore};
use squadhub_delivery::channel::{ChannelRegistry, DeliveryOutcome, DispatchError};
use squadhub_entity::delivery::DeliveryItem;

use crate::backoff::RetryPolicy;

/// Counters from one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Items claimed this cycle.
    pub claimed: usize,
    /// Items that completed.
    pub completed: usize,
    /// Items rescheduled for a later attempt.
    pub retried: usize,
    /// Items that failed permanently.
    pub failed: usize,
}

/// Outcome of processing one claimed item.
enum ItemResult {
    Completed,
    Retried,
    Failed,
}

/// Drains due delivery work items on a fixed interval.
///
/// Each cycle claims a batch atomically (the claim itself transitions
/// items to `processing` and increments the attempt counter, so an
/// overlapping cycle can never pick the same item), fans the claimed
/// items out concurrently, and records each outcome. Dispatch errors are
/// isolated per item; nothing escapes the loop.
#[derive(Debug)]
pub struct DeliveryConsumer {
    delivery: Arc<dyn DeliveryStore>,
    notifications: Arc<dyn NotificationStore>,
    channels: Arc<ChannelRegistry>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    config: WorkerConfig,
}

impl DeliveryConsumer {
    /// Create a new consumer.
    pub fn new(
        delivery: Arc<dyn DeliveryStore>,
        notifications: Arc<dyn NotificationStore>,
        channels: Arc<ChannelRegistry>,
        clock: Arc<dyn Clock>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            delivery,
            notifications,
            channels,
            policy: RetryPolicy::from_config(&config),
            clock,
            config,
        }
    }

    /// Run until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            "Delivery consumer started (batch_size={}, poll_interval={}s, channels={:?})",
            self.config.batch_size,
            self.config.poll_interval_seconds,
            self.channels.registered()
        );

        let poll_interval = StdDuration::from_secs(self.config.poll_interval_seconds);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        info!("Delivery consumer received shutdown signal");
                        break;
                    }
                }
                _ = self.tick() => {
                    tokio::select! {
                        _ = cancel.changed() => {
                            if *cancel.borrow() {
                                info!("Delivery consumer shutting down");
                                break;
                            }
                        }
                        _ = time::sleep(poll_interval) => {}
                    }
                }
            }
        }

        info!("Delivery consumer stopped");
    }

    /// One poll cycle: claim due items and dispatch them concurrently.
    pub async fn tick(&self) -> TickSummary {
        let now = self.clock.now();

        let items = match self.delivery.claim_due(now, self.config.batch_size).await {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to claim due delivery items: {e}");
                return TickSummary::default();
            }
        };

        if items.is_empty() {
            trace!("No delivery items due");
            return TickSummary::default();
        }

        debug!("Claimed {} delivery item(s)", items.len());
        let claimed = items.len();

        let results =
            futures::future::join_all(items.into_iter().map(|item| self.process_item(item))).await;

        let mut summary = TickSummary {
            claimed,
            ..Default::default()
        };
        for result in results {
            match result {
                ItemResult::Completed => summary.completed += 1,
                ItemResult::Retried => summary.retried += 1,
                ItemResult::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Dispatch one claimed item and record its outcome.
    async fn process_item(&self, item: DeliveryItem) -> ItemResult {
        match self.dispatch(&item).await {
            Ok(outcome) => {
                let now = self.clock.now();
                debug!(
                    "Delivery item {} ({}) completed: {:?}",
                    item.id, item.channel, outcome
                );
                if let Err(e) = self.delivery.mark_completed(item.id, now).await {
                    error!("Failed to mark delivery item {} completed: {e}", item.id);
                }
                if let Err(e) = self.notifications.mark_sent(item.notification_id, now).await {
                    error!(
                        "Failed to mark notification {} sent: {e}",
                        item.notification_id
                    );
                }
                ItemResult::Completed
            }
            Err(err) => self.handle_failure(&item, err).await,
        }
    }

    /// Resolve the parent notification and hand the item to its channel
    /// sender.
    async fn dispatch(&self, item: &DeliveryItem) -> Result<DeliveryOutcome, DispatchError> {
        let notification = self
            .notifications
            .find_by_id(item.notification_id)
            .await
            .map_err(|e| DispatchError::Transient(format!("failed to load notification: {e}")))?;

        let Some(notification) = notification else {
            return Err(DispatchError::Permanent("orphan notification".to_string()));
        };

        let Some(sender) = self.channels.get(item.channel) else {
            return Err(DispatchError::Configuration(format!(
                "no sender registered for channel '{}'",
                item.channel
            )));
        };

        sender.deliver(&notification).await
    }

    /// Apply the retry policy, or fail the item permanently when the
    /// budget is exhausted or the error can never succeed.
    async fn handle_failure(&self, item: &DeliveryItem, err: DispatchError) -> ItemResult {
        let message = err.to_string();

        // Unimplemented channels and permanent errors never retry;
        // everything else burns one attempt from the budget.
        let retryable = !matches!(
            err,
            DispatchError::Unimplemented(_) | DispatchError::Permanent(_)
        );

        if retryable && item.attempt_count < item.max_attempts {
            let delay = self.policy.delay_for(item.attempt_count);
            let next_attempt_at = self.clock.now() + delay;
            warn!(
                "Delivery item {} ({}) failed on attempt {}/{}, retrying in {}s: {message}",
                item.id,
                item.channel,
                item.attempt_count,
                item.max_attempts,
                delay.num_seconds()
            );
            if let Err(e) = self
                .delivery
                .mark_retry(item.id, next_attempt_at, &message)
                .await
            {
                error!("Failed to reschedule delivery item {}: {e}", item.id);
            }
            ItemResult::Retried
        } else {
            error!(
                "Delivery item {} ({}) permanently failed after {} attempt(s): {message}",
                item.id, item.channel, item.attempt_count
            );
            if let Err(e) = self.delivery.mark_failed(item.id, &message).await {
                error!("Failed to fail delivery item {}: {e}", item.id);
            }
            if let Err(e) = self
                .notifications
                .mark_failed(item.notification_id, &message)
                .await
            {
                error!(
                    "Failed to mark notification {} failed: {e}",
                    item.notification_id
                );
            }
            ItemResult::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use squadhub_core::result::AppResult;
    use squadhub_core::traits::clock::ManualClock;
    use squadhub_delivery::channel::ChannelSender;
    use squadhub_entity::delivery::DeliveryStatus;
    use squadhub_entity::notification::{
        ChannelKind, NewNotification, Notification, NotificationKind, NotificationPriority,
        NotificationStatus,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory delivery store with an atomic claim under one lock.
    #[derive(Debug, Default)]
    struct InMemoryDelivery {
        items: Mutex<HashMap<Uuid, DeliveryItem>>,
        claims: Mutex<HashMap<Uuid, usize>>,
    }

    impl InMemoryDelivery {
        fn get(&self, id: Uuid) -> DeliveryItem {
            self.items.lock().unwrap().get(&id).unwrap().clone()
        }

        fn claim_count(&self, id: Uuid) -> usize {
            *self.claims.lock().unwrap().get(&id).unwrap_or(&0)
        }
    }

    #[async_trait]
    impl DeliveryStore for InMemoryDelivery {
        async fn enqueue(&self, item: &DeliveryItem) -> AppResult<()> {
            self.items.lock().unwrap().insert(item.id, item.clone());
            Ok(())
        }

        async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<DeliveryItem>> {
            let mut items = self.items.lock().unwrap();

            let mut due: Vec<Uuid> = items
                .values()
                .filter(|item| item.is_due(now))
                .map(|item| item.id)
                .collect();
            due.sort_by_key(|id| {
                let item = &items[id];
                (
                    std::cmp::Reverse(item.priority.numeric_priority()),
                    item.scheduled_for,
                )
            });
            due.truncate(limit as usize);

            let mut claimed = Vec::new();
            for id in due {
                let item = items.get_mut(&id).unwrap();
                item.status = DeliveryStatus::Processing;
                item.attempt_count += 1;
                item.started_at = Some(now);
                item.updated_at = now;
                *self.claims.lock().unwrap().entry(id).or_insert(0) += 1;
                claimed.push(item.clone());
            }
            Ok(claimed)
        }

        async fn mark_completed(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
            if let Some(item) = self.items.lock().unwrap().get_mut(&id) {
                item.status = DeliveryStatus::Completed;
                item.completed_at = Some(at);
                item.next_attempt_at = None;
                item.error_message = None;
                item.updated_at = at;
            }
            Ok(())
        }

        async fn mark_retry(
            &self,
            id: Uuid,
            next_attempt_at: DateTime<Utc>,
            error: &str,
        ) -> AppResult<()> {
            if let Some(item) = self.items.lock().unwrap().get_mut(&id) {
                item.status = DeliveryStatus::Failed;
                item.next_attempt_at = Some(next_attempt_at);
                item.error_message = Some(error.to_string());
            }
            Ok(())
        }

        async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
            if let Some(item) = self.items.lock().unwrap().get_mut(&id) {
                item.status = DeliveryStatus::Failed;
                item.next_attempt_at = None;
                item.error_message = Some(error.to_string());
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct InMemoryNotifications {
        rows: Mutex<HashMap<Uuid, Notification>>,
    }

    impl InMemoryNotifications {
        fn get(&self, id: Uuid) -> Notification {
            self.rows.lock().unwrap().get(&id).unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationStore for InMemoryNotifications {
        async fn create(&self, notification: &Notification) -> AppResult<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(notification.id, notification.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn mark_sent(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
            if let Some(n) = self.rows.lock().unwrap().get_mut(&id) {
                if !matches!(
                    n.status,
                    NotificationStatus::Delivered | NotificationStatus::Read
                ) {
                    n.status = NotificationStatus::Sent;
                    n.sent_at.get_or_insert(at);
                    n.error_message = None;
                }
            }
            Ok(())
        }

        async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
            if let Some(n) = self.rows.lock().unwrap().get_mut(&id) {
                if matches!(
                    n.status,
                    NotificationStatus::Pending | NotificationStatus::Failed
                ) {
                    n.status = NotificationStatus::Failed;
                    n.error_message = Some(error.to_string());
                }
            }
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

    /// What a scripted sender does on every deliver call.
    #[derive(Debug, Clone, Copy)]
    enum SenderScript {
        Deliver,
        Suppress,
        FailTransient,
    }

    #[derive(Debug)]
    struct ScriptedSender {
        channel: ChannelKind,
        script: SenderScript,
        calls: AtomicUsize,
    }

    impl ScriptedSender {
        fn new(channel: ChannelKind, script: SenderScript) -> Self {
            Self {
                channel,
                script,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChannelSender for ScriptedSender {
        fn channel(&self) -> ChannelKind {
            self.channel
        }

        async fn deliver(
            &self,
            _notification: &Notification,
        ) -> Result<DeliveryOutcome, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                SenderScript::Deliver => Ok(DeliveryOutcome::Delivered),
                SenderScript::Suppress => Ok(DeliveryOutcome::Suppressed),
                SenderScript::FailTransient => {
                    Err(DispatchError::Transient("connection reset".to_string()))
                }
            }
        }
    }

    struct Harness {
        delivery: Arc<InMemoryDelivery>,
        notifications: Arc<InMemoryNotifications>,
        clock: Arc<ManualClock>,
        consumer: DeliveryConsumer,
    }

    fn harness(senders: Vec<Arc<ScriptedSender>>) -> Harness {
        let delivery = Arc::new(InMemoryDelivery::default());
        let notifications = Arc::new(InMemoryNotifications::default());
        let clock = Arc::new(ManualClock::starting_at(Utc::now()));

        let mut registry = ChannelRegistry::new();
        for sender in senders {
            registry.register(sender);
        }

        let consumer = DeliveryConsumer::new(
            Arc::clone(&delivery) as Arc<dyn DeliveryStore>,
            Arc::clone(&notifications) as Arc<dyn NotificationStore>,
            Arc::new(registry),
            Arc::clone(&clock) as Arc<dyn Clock>,
            WorkerConfig::default(),
        );

        Harness {
            delivery,
            notifications,
            clock,
            consumer,
        }
    }

    async fn seed(
        harness: &Harness,
        channels: Vec<ChannelKind>,
        priority: NotificationPriority,
    ) -> (Notification, Vec<Uuid>) {
        let now = harness.clock.now();
        let notification = NewNotification {
            recipient_id: Uuid::new_v4(),
            organization_id: None,
            team_id: None,
            kind: NotificationKind::TrainingScheduled,
            title: "Tuesday session".to_string(),
            message: "7pm east pitch".to_string(),
            action_url: None,
            action_text: None,
            priority,
            channels: channels.clone(),
            metadata: serde_json::Value::Null,
        }
        .into_notification(now);
        harness.notifications.create(&notification).await.unwrap();

        let mut item_ids = Vec::new();
        for channel in channels {
            let item = DeliveryItem::enqueue(&notification, channel, 3, now);
            item_ids.push(item.id);
            harness.delivery.enqueue(&item).await.unwrap();
        }
        (notification, item_ids)
    }

    #[tokio::test]
    async fn test_due_items_complete_and_notification_is_sent() {
        let email = Arc::new(ScriptedSender::new(ChannelKind::Email, SenderScript::Deliver));
        let push = Arc::new(ScriptedSender::new(ChannelKind::Push, SenderScript::Deliver));
        let h = harness(vec![Arc::clone(&email), Arc::clone(&push)]);

        let (n, item_ids) = seed(
            &h,
            vec![ChannelKind::Email, ChannelKind::Push],
            NotificationPriority::High,
        )
        .await;

        let summary = h.consumer.tick().await;
        assert_eq!(summary.claimed, 2);
        assert_eq!(summary.completed, 2);

        for id in item_ids {
            assert_eq!(h.delivery.get(id).status, DeliveryStatus::Completed);
        }
        let stored = h.notifications.get(n.id);
        assert_eq!(stored.status, NotificationStatus::Sent);
        assert!(stored.sent_at.is_some());
        assert_eq!(email.calls.load(Ordering::SeqCst), 1);
        assert_eq!(push.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_suppressed_outcome_completes_without_failure() {
        let email = Arc::new(ScriptedSender::new(ChannelKind::Email, SenderScript::Suppress));
        let h = harness(vec![Arc::clone(&email)]);

        let (n, item_ids) = seed(&h, vec![ChannelKind::Email], NotificationPriority::Medium).await;

        let summary = h.consumer.tick().await;
        assert_eq!(summary.completed, 1);
        assert_eq!(h.delivery.get(item_ids[0]).status, DeliveryStatus::Completed);
        assert_eq!(h.notifications.get(n.id).status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn test_concurrent_ticks_claim_each_item_once() {
        let email = Arc::new(ScriptedSender::new(ChannelKind::Email, SenderScript::Deliver));
        let h = harness(vec![Arc::clone(&email)]);

        let mut item_ids = Vec::new();
        for _ in 0..5 {
            let (_, ids) = seed(&h, vec![ChannelKind::Email], NotificationPriority::Medium).await;
            item_ids.extend(ids);
        }

        let consumer = Arc::new(h.consumer);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let consumer = Arc::clone(&consumer);
            handles.push(tokio::spawn(async move { consumer.tick().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Exactly one cycle claimed each item; exactly one dispatch each.
        for id in &item_ids {
            assert_eq!(h.delivery.claim_count(*id), 1);
            assert_eq!(h.delivery.get(*id).status, DeliveryStatus::Completed);
        }
        assert_eq!(email.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_transient_failure_applies_escalating_backoff() {
        let email = Arc::new(ScriptedSender::new(
            ChannelKind::Email,
            SenderScript::FailTransient,
        ));
        let h = harness(vec![Arc::clone(&email)]);

        let (_, item_ids) = seed(&h, vec![ChannelKind::Email], NotificationPriority::Medium).await;
        let id = item_ids[0];

        let summary = h.consumer.tick().await;
        assert_eq!(summary.retried, 1);

        let after_first = h.delivery.get(id);
        assert_eq!(after_first.status, DeliveryStatus::Failed);
        assert_eq!(after_first.attempt_count, 1);
        let first_retry_at = after_first.next_attempt_at.unwrap();
        assert_eq!(first_retry_at, h.clock.now() + Duration::seconds(60));

        // Not due again until the backoff elapses.
        h.clock.advance(Duration::seconds(30));
        assert_eq!(h.consumer.tick().await.claimed, 0);

        h.clock.advance(Duration::seconds(31));
        let summary = h.consumer.tick().await;
        assert_eq!(summary.retried, 1);

        let after_second = h.delivery.get(id);
        assert_eq!(after_second.attempt_count, 2);
        let second_retry_at = after_second.next_attempt_at.unwrap();
        assert_eq!(second_retry_at, h.clock.now() + Duration::seconds(300));
        assert!(second_retry_at - first_retry_at >= Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_attempt_budget_exhaustion_is_terminal() {
        let email = Arc::new(ScriptedSender::new(
            ChannelKind::Email,
            SenderScript::FailTransient,
        ));
        let h = harness(vec![Arc::clone(&email)]);

        let (n, item_ids) = seed(&h, vec![ChannelKind::Email], NotificationPriority::Medium).await;
        let id = item_ids[0];

        // Three cycles, advancing past each backoff window.
        assert_eq!(h.consumer.tick().await.retried, 1);
        h.clock.advance(Duration::seconds(61));
        assert_eq!(h.consumer.tick().await.retried, 1);
        h.clock.advance(Duration::seconds(301));
        let third = h.consumer.tick().await;
        assert_eq!(third.failed, 1);

        let item = h.delivery.get(id);
        assert_eq!(item.status, DeliveryStatus::Failed);
        assert_eq!(item.attempt_count, 3);
        assert!(item.next_attempt_at.is_none());
        assert_eq!(h.notifications.get(n.id).status, NotificationStatus::Failed);

        // Never selected again, no matter how far time advances.
        h.clock.advance(Duration::days(1));
        assert_eq!(h.consumer.tick().await.claimed, 0);
        assert_eq!(email.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unimplemented_channel_fails_without_retries() {
        let h = harness(vec![]);

        // Register the real SMS placeholder.
        let mut registry = ChannelRegistry::new();
        registry.register(Arc::new(squadhub_delivery::channel::sms::SmsSender::new()));
        let consumer = DeliveryConsumer::new(
            Arc::clone(&h.delivery) as Arc<dyn DeliveryStore>,
            Arc::clone(&h.notifications) as Arc<dyn NotificationStore>,
            Arc::new(registry),
            Arc::clone(&h.clock) as Arc<dyn Clock>,
            WorkerConfig::default(),
        );

        let (n, item_ids) = seed(&h, vec![ChannelKind::Sms], NotificationPriority::Medium).await;

        let summary = consumer.tick().await;
        assert_eq!(summary.failed, 1);

        let item = h.delivery.get(item_ids[0]);
        assert_eq!(item.status, DeliveryStatus::Failed);
        assert_eq!(item.attempt_count, 1);
        assert!(item.next_attempt_at.is_none());
        assert_eq!(h.notifications.get(n.id).status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_orphan_item_fails_permanently() {
        let email = Arc::new(ScriptedSender::new(ChannelKind::Email, SenderScript::Deliver));
        let h = harness(vec![Arc::clone(&email)]);

        let (n, item_ids) = seed(&h, vec![ChannelKind::Email], NotificationPriority::Medium).await;
        // Notification deleted after enqueue.
        h.notifications.rows.lock().unwrap().remove(&n.id);

        let summary = h.consumer.tick().await;
        assert_eq!(summary.failed, 1);

        let item = h.delivery.get(item_ids[0]);
        assert_eq!(item.status, DeliveryStatus::Failed);
        assert!(item.next_attempt_at.is_none());
        assert!(item.error_message.unwrap().contains("orphan"));
        assert_eq!(email.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_urgent_items_claimed_before_low_priority() {
        let email = Arc::new(ScriptedSender::new(ChannelKind::Email, SenderScript::Deliver));
        let h = harness(vec![Arc::clone(&email)]);

        // Low-priority item scheduled earlier than the urgent one.
        let (low, _) = seed(&h, vec![ChannelKind::Email], NotificationPriority::Low).await;
        h.clock.advance(Duration::seconds(10));
        let (urgent, _) = seed(&h, vec![ChannelKind::Email], NotificationPriority::Urgent).await;

        // Batch of one: the urgent item overtakes the older low one.
        let mut config = WorkerConfig::default();
        config.batch_size = 1;
        let consumer = DeliveryConsumer::new(
            Arc::clone(&h.delivery) as Arc<dyn DeliveryStore>,
            Arc::clone(&h.notifications) as Arc<dyn NotificationStore>,
            Arc::new({
                let mut registry = ChannelRegistry::new();
                registry.register(email);
                registry
            }),
            Arc::clone(&h.clock) as Arc<dyn Clock>,
            config,
        );

        consumer.tick().await;
        assert_eq!(
            h.notifications.get(urgent.id).status,
            NotificationStatus::Sent
        );
        assert_eq!(h.notifications.get(low.id).status, NotificationStatus::Pending);
    }

    #[tokio::test]
    async fn test_unregistered_channel_follows_retry_policy() {
        // Registry without an email sender: configuration error, retried.
        let h = harness(vec![]);
        let (_, item_ids) = seed(&h, vec![ChannelKind::Email], NotificationPriority::Medium).await;

        let summary = h.consumer.tick().await;
        assert_eq!(summary.retried, 1);

        let item = h.delivery.get(item_ids[0]);
        assert_eq!(item.status, DeliveryStatus::Failed);
        assert!(item.next_attempt_at.is_some());
    }
}
