//! Push subscription repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use squadhub_core::error::{AppError, ErrorKind};
use squadhub_core::result::AppResult;
use squadhub_entity::push::PushSubscription;

use crate::store::PushSubscriptionStore;

/// Repository for push subscription lifecycle operations.
#[derive(Debug, Clone)]
pub struct PushSubscriptionRepository {
    pool: PgPool,
}

impl PushSubscriptionRepository {
    /// Create a new push subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PushSubscriptionStore for PushSubscriptionRepository {
    /// Upsert keyed on the endpoint: the same browser re-subscribing
    /// updates keys and metadata instead of duplicating the row.
    async fn upsert(&self, subscription: &PushSubscription) -> AppResult<PushSubscription> {
        sqlx::query_as::<_, PushSubscription>(
            "INSERT INTO push_subscriptions \
             (id, user_id, endpoint, p256dh, auth, user_agent, browser, device, \
              last_used_at, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (endpoint) DO UPDATE SET \
                user_id = EXCLUDED.user_id, \
                p256dh = EXCLUDED.p256dh, \
                auth = EXCLUDED.auth, \
                user_agent = EXCLUDED.user_agent, \
                browser = EXCLUDED.browser, \
                device = EXCLUDED.device, \
                is_active = TRUE, \
                updated_at = EXCLUDED.updated_at \
             RETURNING *",
        )
        .bind(subscription.id)
        .bind(subscription.user_id)
        .bind(&subscription.endpoint)
        .bind(&subscription.p256dh)
        .bind(&subscription.auth)
        .bind(&subscription.user_agent)
        .bind(&subscription.browser)
        .bind(&subscription.device)
        .bind(subscription.last_used_at)
        .bind(subscription.is_active)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to upsert push subscription", e)
        })
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<PushSubscription>> {
        sqlx::query_as::<_, PushSubscription>(
            "SELECT * FROM push_subscriptions \
             WHERE user_id = $1 AND is_active = TRUE \
             ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list push subscriptions", e)
        })
    }

    async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE push_subscriptions SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate subscription", e)
        })?;
        Ok(())
    }

    async fn deactivate_by_endpoint(&self, endpoint: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE push_subscriptions SET is_active = FALSE, updated_at = NOW() \
             WHERE endpoint = $1",
        )
        .bind(endpoint)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate subscription", e)
        })?;
        Ok(())
    }

    async fn touch(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE push_subscriptions SET last_used_at = $2, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to touch subscription", e)
        })?;
        Ok(())
    }

    async fn deactivate_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE push_subscriptions SET is_active = FALSE, updated_at = NOW() \
             WHERE is_active = TRUE AND last_used_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep stale subscriptions", e)
        })?;
        Ok(result.rows_affected())
    }
}
