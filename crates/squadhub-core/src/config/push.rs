//! Web Push configuration.

use serde::{Deserialize, Serialize};

/// VAPID-authenticated Web Push configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// VAPID subject (`mailto:` or https URL identifying the server).
    pub vapid_subject: String,
    /// Base64 URL-safe VAPID public key.
    pub vapid_public_key: String,
    /// Base64 URL-safe VAPID private key.
    pub vapid_private_key: String,
    /// Time-to-live for queued push messages, in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u32,
    /// Maximum concurrent sends during a per-user fan-out.
    #[serde(default = "default_fanout")]
    pub fanout_concurrency: usize,
    /// Days of inactivity after which a subscription is swept.
    #[serde(default = "default_stale_after")]
    pub stale_after_days: i64,
}

fn default_ttl() -> u32 {
    86_400
}

fn default_fanout() -> usize {
    8
}

fn default_stale_after() -> i64 {
    30
}
