//! Presence-based suppression configuration.

use serde::{Deserialize, Serialize};

/// Settings for the presence oracle used by email/push suppression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Minutes since `last_seen_at` after which a user counts as offline,
    /// regardless of their recorded status.
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold_minutes: i64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            offline_threshold_minutes: default_offline_threshold(),
        }
    }
}

fn default_offline_threshold() -> i64 {
    15
}
