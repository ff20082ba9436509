//! Queue consumer configuration.

use serde::{Deserialize, Serialize};

/// Delivery queue consumer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the consumer is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of work items claimed per poll cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Interval in seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Default maximum delivery attempts per work item.
    #[serde(default = "default_max_attempts")]
    pub default_max_attempts: i32,
    /// Maximum delivery attempts for urgent notifications.
    #[serde(default = "default_urgent_max_attempts")]
    pub urgent_max_attempts: i32,
    /// Retry delay table in seconds, indexed by attempt number.
    /// Attempts beyond the table length use the last entry.
    #[serde(default = "default_retry_delays")]
    pub retry_delay_seconds: Vec<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: default_batch_size(),
            poll_interval_seconds: default_poll_interval(),
            default_max_attempts: default_max_attempts(),
            urgent_max_attempts: default_urgent_max_attempts(),
            retry_delay_seconds: default_retry_delays(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> i64 {
    10
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_attempts() -> i32 {
    3
}

fn default_urgent_max_attempts() -> i32 {
    5
}

fn default_retry_delays() -> Vec<u64> {
    vec![60, 300, 900, 3600]
}
