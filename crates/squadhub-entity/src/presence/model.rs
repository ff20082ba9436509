//! Presence record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::PresenceStatus;

/// The last known presence state for one user.
///
/// Written by the presence service elsewhere in the system; the pipeline
/// only reads it through the presence oracle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PresenceRecord {
    /// User ID.
    pub user_id: Uuid,
    /// Recorded status.
    pub status: PresenceStatus,
    /// Last activity timestamp.
    pub last_seen_at: DateTime<Utc>,
    /// When the user went away, if away.
    pub away_since: Option<DateTime<Utc>>,
    /// Until when the user is busy, if busy.
    pub busy_until: Option<DateTime<Utc>>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}
