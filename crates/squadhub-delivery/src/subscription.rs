//! Push subscription lifecycle management.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use squadhub_core::config::push::PushConfig;
use squadhub_core::result::AppResult;
use squadhub_core::traits::clock::Clock;
use squadhub_database::store::PushSubscriptionStore;
use squadhub_entity::push::PushSubscription;

/// Parameters for registering a browser push endpoint.
#[derive(Debug, Clone)]
pub struct RegisterSubscription {
    /// Owning user.
    pub user_id: Uuid,
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Client public key.
    pub p256dh: String,
    /// Client auth secret.
    pub auth: String,
    /// Raw user agent of the registering browser.
    pub user_agent: Option<String>,
}

/// Manages the lifecycle of push endpoints: upsert on subscribe,
/// soft-delete on unsubscribe, and a periodic sweep of endpoints unused
/// for the configured number of days.
#[derive(Debug)]
pub struct PushSubscriptionRegistry {
    store: Arc<dyn PushSubscriptionStore>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl PushSubscriptionRegistry {
    /// Create a new registry.
    pub fn new(store: Arc<dyn PushSubscriptionStore>, clock: Arc<dyn Clock>, config: &PushConfig) -> Self {
        Self {
            store,
            clock,
            stale_after: Duration::days(config.stale_after_days),
        }
    }

    /// Register or refresh a subscription, upserting by endpoint so a
    /// re-subscribing browser updates its keys instead of duplicating.
    pub async fn register(&self, params: RegisterSubscription) -> AppResult<PushSubscription> {
        let now = self.clock.now();
        let (browser, device) = params
            .user_agent
            .as_deref()
            .map(parse_user_agent)
            .unwrap_or((None, None));

        let subscription = PushSubscription {
            id: Uuid::new_v4(),
            user_id: params.user_id,
            endpoint: params.endpoint,
            p256dh: params.p256dh,
            auth: params.auth,
            user_agent: params.user_agent,
            browser,
            device,
            last_used_at: now,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let stored = self.store.upsert(&subscription).await?;
        debug!(
            "Registered push subscription {} for {}",
            stored.id, stored.user_id
        );
        Ok(stored)
    }

    /// Deactivate a subscription by endpoint. History is retained.
    pub async fn unsubscribe(&self, endpoint: &str) -> AppResult<()> {
        self.store.deactivate_by_endpoint(endpoint).await?;
        debug!("Unsubscribed push endpoint {endpoint}");
        Ok(())
    }

    /// Deactivate every subscription unused past the staleness window.
    pub async fn sweep_stale(&self) -> AppResult<u64> {
        let cutoff = self.clock.now() - self.stale_after;
        let count = self.store.deactivate_stale(cutoff).await?;
        if count > 0 {
            info!("Swept {count} stale push subscriptions");
        }
        Ok(count)
    }
}

/// Best-effort browser/device extraction from a user agent string.
/// Diagnostics only; delivery never branches on it.
fn parse_user_agent(user_agent: &str) -> (Option<String>, Option<String>) {
    let browser = if user_agent.contains("Edg/") {
        Some("Edge")
    } else if user_agent.contains("OPR/") {
        Some("Opera")
    } else if user_agent.contains("Chrome/") {
        Some("Chrome")
    } else if user_agent.contains("Firefox/") {
        Some("Firefox")
    } else if user_agent.contains("Safari/") {
        Some("Safari")
    } else {
        None
    };

    let device = if user_agent.contains("iPhone") {
        Some("iPhone")
    } else if user_agent.contains("iPad") {
        Some("iPad")
    } else if user_agent.contains("Android") {
        Some("Android")
    } else if user_agent.contains("Mobile") {
        Some("Mobile")
    } else {
        Some("Desktop")
    };

    (
        browser.map(str::to_string),
        device.map(str::to_string),
    )
}
