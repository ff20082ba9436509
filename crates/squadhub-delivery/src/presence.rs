//! Presence oracle — decides whether a user counts as offline for
//! email/push purposes.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use squadhub_core::config::presence::PresenceConfig;
use squadhub_core::result::AppResult;
use squadhub_core::traits::clock::Clock;
use squadhub_database::store::PresenceStore;
use squadhub_entity::presence::PresenceStatus;

/// Answers "is this user reachable live, or should email/push fire?".
///
/// A user counts as offline when there is no presence record, the record
/// says `offline`, or `last_seen_at` is older than the configured
/// threshold. A stale away/busy status does not keep a user reachable.
#[derive(Debug)]
pub struct PresenceOracle {
    store: Arc<dyn PresenceStore>,
    clock: Arc<dyn Clock>,
    offline_threshold: Duration,
}

impl PresenceOracle {
    /// Create a new presence oracle.
    pub fn new(store: Arc<dyn PresenceStore>, clock: Arc<dyn Clock>, config: &PresenceConfig) -> Self {
        Self {
            store,
            clock,
            offline_threshold: Duration::minutes(config.offline_threshold_minutes),
        }
    }

    /// Check whether a user counts as offline for notification purposes.
    pub async fn is_offline(&self, user_id: Uuid) -> AppResult<bool> {
        let Some(record) = self.store.find_by_user(user_id).await? else {
            return Ok(true);
        };

        if record.status == PresenceStatus::Offline {
            return Ok(true);
        }

        Ok(self.clock.now() - record.last_seen_at > self.offline_threshold)
    }

    /// Check whether a user is reachable live (in-app).
    pub async fn is_reachable(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(!self.is_offline(user_id).await?)
    }
}
