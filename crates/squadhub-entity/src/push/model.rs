//! Push subscription entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use squadhub_core::traits::push::PushTarget;

/// One browser push endpoint registered by a user.
///
/// Lifecycle: upserted by endpoint on subscribe, soft-deleted on
/// unsubscribe or when the push service reports the endpoint gone
/// (HTTP 404/410), and swept after 30 days of inactivity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PushSubscription {
    /// Unique subscription identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Push service endpoint URL. Globally unique.
    pub endpoint: String,
    /// Client public key (P-256 ECDH).
    pub p256dh: String,
    /// Client auth secret.
    pub auth: String,
    /// Raw user agent captured at registration.
    pub user_agent: Option<String>,
    /// Browser family parsed from the user agent. Diagnostics only.
    pub browser: Option<String>,
    /// Device family parsed from the user agent. Diagnostics only.
    pub device: Option<String>,
    /// Last successful delivery through this endpoint.
    pub last_used_at: DateTime<Utc>,
    /// Whether the subscription is live.
    pub is_active: bool,
    /// When the subscription was first registered.
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated.
    pub updated_at: DateTime<Utc>,
}

impl PushSubscription {
    /// The endpoint and keys in the shape the push provider consumes.
    pub fn as_target(&self) -> PushTarget {
        PushTarget {
            endpoint: self.endpoint.clone(),
            p256dh: self.p256dh.clone(),
            auth: self.auth.clone(),
        }
    }
}
