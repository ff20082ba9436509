//! Notification repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use squadhub_core::error::{AppError, ErrorKind};
use squadhub_core::result::AppResult;
use squadhub_entity::notification::Notification;

use crate::store::NotificationStore;

/// Repository for notification CRUD operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read_at IS NULL",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))?;
        Ok(count)
    }

    /// Mark a notification as read. `read_at` is stamped once.
    pub async fn mark_read(&self, id: Uuid, recipient_id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE notifications SET status = 'read', read_at = COALESCE(read_at, $3) \
             WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(&self, notification: &Notification) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notifications \
             (id, recipient_id, organization_id, team_id, kind, title, message, action_url, \
              action_text, priority, channels, status, error_message, metadata, created_at, \
              sent_at, delivered_at, read_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)",
        )
        .bind(notification.id)
        .bind(notification.recipient_id)
        .bind(notification.organization_id)
        .bind(notification.team_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.action_url)
        .bind(&notification.action_text)
        .bind(notification.priority)
        .bind(&notification.channels)
        .bind(notification.status)
        .bind(&notification.error_message)
        .bind(&notification.metadata)
        .bind(notification.created_at)
        .bind(notification.sent_at)
        .bind(notification.delivered_at)
        .bind(notification.read_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to create notification", e)
        })?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find notification", e)
            })
    }

    /// Status advances to `sent` and `sent_at` is stamped once; a
    /// notification already `delivered` or `read` is left untouched.
    async fn mark_sent(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE notifications SET status = 'sent', sent_at = COALESCE(sent_at, $2), \
             error_message = NULL \
             WHERE id = $1 AND status IN ('pending', 'sent', 'failed')",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark notification sent", e)
        })?;
        Ok(())
    }

    /// Only a notification that never reached `sent` can become `failed`.
    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE notifications SET status = 'failed', error_message = $2 \
             WHERE id = $1 AND status IN ('pending', 'failed')",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark notification failed", e)
        })?;
        Ok(())
    }

    async fn list_digest_candidates(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE created_at >= $1 AND read_at IS NULL \
             AND channels @> '\"email\"'::jsonb \
             AND COALESCE((metadata->>'digest_sent')::boolean, FALSE) = FALSE \
             ORDER BY recipient_id, created_at ASC",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list digest candidates", e)
        })
    }

    async fn mark_digest_sent(&self, ids: &[Uuid]) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET metadata = jsonb_set(COALESCE(metadata, '{}'::jsonb), '{digest_sent}', 'true'::jsonb) \
             WHERE id = ANY($1)",
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark digest sent", e))?;
        Ok(result.rows_affected())
    }
}
