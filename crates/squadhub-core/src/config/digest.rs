//! Digest aggregation configuration.

use serde::{Deserialize, Serialize};

/// Settings for the time-windowed digest aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Whether digest aggregation is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the daily digest run (seconds-resolution).
    #[serde(default = "default_daily_cron")]
    pub daily_cron: String,
    /// Cron expression for the weekly digest run (seconds-resolution).
    #[serde(default = "default_weekly_cron")]
    pub weekly_cron: String,
    /// Minimum number of qualifying notifications before a recipient
    /// receives a digest instead of individual emails.
    #[serde(default = "default_min_notifications")]
    pub min_notifications: usize,
    /// Delay between consecutive digest emails, in milliseconds.
    #[serde(default = "default_inter_message_delay")]
    pub inter_message_delay_ms: u64,
    /// Maximum items listed per notification type in one digest email.
    #[serde(default = "default_max_items_per_kind")]
    pub max_items_per_kind: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_cron: default_daily_cron(),
            weekly_cron: default_weekly_cron(),
            min_notifications: default_min_notifications(),
            inter_message_delay_ms: default_inter_message_delay(),
            max_items_per_kind: default_max_items_per_kind(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_daily_cron() -> String {
    "0 0 8 * * *".to_string()
}

fn default_weekly_cron() -> String {
    "0 0 8 * * MON".to_string()
}

fn default_min_notifications() -> usize {
    3
}

fn default_inter_message_delay() -> u64 {
    100
}

fn default_max_items_per_kind() -> usize {
    5
}
