//! Persistence contracts consumed by the pipeline.
//!
//! The queue consumer, channel senders, and digest aggregator depend on
//! these traits rather than on the concrete sqlx repositories, so tests
//! can substitute in-memory doubles. The repositories in
//! [`crate::repositories`] are the production implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use squadhub_core::result::AppResult;
use squadhub_entity::delivery::DeliveryItem;
use squadhub_entity::notification::Notification;
use squadhub_entity::presence::PresenceRecord;
use squadhub_entity::push::PushSubscription;

/// Persistence for notifications.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new notification.
    async fn create(&self, notification: &Notification) -> AppResult<()>;

    /// Find a notification by id.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// Record a successful channel delivery: status becomes `sent` and
    /// `sent_at` is stamped once. Never demotes `delivered`/`read`.
    async fn mark_sent(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Record that every channel delivery exhausted its budget.
    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()>;

    /// Unread, email-eligible notifications created at or after `cutoff`
    /// that no digest has included yet.
    async fn list_digest_candidates(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Notification>>;

    /// Flag the given notifications as included in a sent digest.
    async fn mark_digest_sent(&self, ids: &[Uuid]) -> AppResult<u64>;
}

/// Persistence and claiming for delivery work items.
#[async_trait]
pub trait DeliveryStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new work item.
    async fn enqueue(&self, item: &DeliveryItem) -> AppResult<()>;

    /// Atomically claim up to `limit` due items: pending items whose
    /// `scheduled_for` has passed, and failed items with attempts left
    /// whose `next_attempt_at` has passed, ordered by priority then
    /// scheduled time. The claim transitions each item to `processing`,
    /// increments `attempt_count`, and stamps `started_at` in the same
    /// mutation, so overlapping poll cycles can never claim the same
    /// item twice.
    async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<DeliveryItem>>;

    /// Mark a claimed item delivered.
    async fn mark_completed(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Return a claimed item to the retryable `failed` state with a
    /// scheduled next attempt.
    async fn mark_retry(
        &self,
        id: Uuid,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<()>;

    /// Permanently fail an item. It is never selected again.
    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()>;
}

/// Read access to presence records.
#[async_trait]
pub trait PresenceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find the presence record for a user, if one exists.
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<PresenceRecord>>;
}

/// Persistence for push subscriptions.
#[async_trait]
pub trait PushSubscriptionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a subscription, or update keys/metadata and re-activate if
    /// the endpoint is already registered.
    async fn upsert(&self, subscription: &PushSubscription) -> AppResult<PushSubscription>;

    /// All active subscriptions for a user.
    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<PushSubscription>>;

    /// Soft-delete one subscription by id.
    async fn deactivate(&self, id: Uuid) -> AppResult<()>;

    /// Soft-delete one subscription by endpoint (explicit unsubscribe).
    async fn deactivate_by_endpoint(&self, endpoint: &str) -> AppResult<()>;

    /// Record a successful delivery through the subscription.
    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Soft-delete every active subscription unused since `cutoff`.
    /// Returns the number deactivated.
    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}
