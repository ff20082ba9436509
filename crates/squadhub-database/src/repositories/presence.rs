//! Presence record repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use squadhub_core::error::{AppError, ErrorKind};
use squadhub_core::result::AppResult;
use squadhub_entity::presence::PresenceRecord;

use crate::store::PresenceStore;

/// Read-side repository for presence records.
///
/// Presence is written by the realtime service elsewhere in the system;
/// the pipeline only reads it.
#[derive(Debug, Clone)]
pub struct PresenceRepository {
    pool: PgPool,
}

impl PresenceRepository {
    /// Create a new presence repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresenceStore for PresenceRepository {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<PresenceRecord>> {
        sqlx::query_as::<_, PresenceRecord>(
            "SELECT * FROM presence_records WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find presence record", e)
        })
    }
}
