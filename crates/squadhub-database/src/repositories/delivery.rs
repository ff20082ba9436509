//! Delivery work item repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use squadhub_core::error::{AppError, ErrorKind};
use squadhub_core::result::AppResult;
use squadhub_entity::delivery::DeliveryItem;

use crate::store::DeliveryStore;

/// Repository for delivery work item CRUD and queue operations.
#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    pool: PgPool,
}

impl DeliveryRepository {
    /// Create a new delivery repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a work item by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<DeliveryItem>> {
        sqlx::query_as::<_, DeliveryItem>("SELECT * FROM delivery_items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find delivery item", e)
            })
    }
}

#[async_trait]
impl DeliveryStore for DeliveryRepository {
    async fn enqueue(&self, item: &DeliveryItem) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO delivery_items \
             (id, notification_id, channel, priority, status, scheduled_for, started_at, \
              completed_at, attempt_count, max_attempts, next_attempt_at, error_message, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(item.id)
        .bind(item.notification_id)
        .bind(item.channel)
        .bind(item.priority)
        .bind(item.status)
        .bind(item.scheduled_for)
        .bind(item.started_at)
        .bind(item.completed_at)
        .bind(item.attempt_count)
        .bind(item.max_attempts)
        .bind(item.next_attempt_at)
        .bind(&item.error_message)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to enqueue delivery item", e)
        })?;
        Ok(())
    }

    /// Claim due items (SKIP LOCKED so overlapping cycles never double-claim).
    async fn claim_due(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<DeliveryItem>> {
        sqlx::query_as::<_, DeliveryItem>(
            "UPDATE delivery_items SET status = 'processing', \
             attempt_count = attempt_count + 1, started_at = $1, updated_at = $1 \
             WHERE id IN ( \
                SELECT id FROM delivery_items \
                WHERE (status = 'pending' AND scheduled_for <= $1) \
                   OR (status = 'failed' AND attempt_count < max_attempts \
                       AND next_attempt_at IS NOT NULL AND next_attempt_at <= $1) \
                ORDER BY \
                    CASE priority WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 \
                                  WHEN 'medium' THEN 2 WHEN 'low' THEN 3 END, \
                    scheduled_for ASC \
                FOR UPDATE SKIP LOCKED \
                LIMIT $2 \
             ) RETURNING *",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to claim delivery items", e)
        })
    }

    async fn mark_completed(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE delivery_items SET status = 'completed', completed_at = $2, \
             error_message = NULL, next_attempt_at = NULL, updated_at = $2 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to complete delivery item", e)
        })?;
        Ok(())
    }

    async fn mark_retry(
        &self,
        id: Uuid,
        next_attempt_at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE delivery_items SET status = 'failed', next_attempt_at = $2, \
             error_message = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(next_attempt_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to reschedule delivery item", e)
        })?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE delivery_items SET status = 'failed', next_attempt_at = NULL, \
             error_message = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fail delivery item", e)
        })?;
        Ok(())
    }
}
