//! Retry/backoff policy.

use chrono::Duration;

use squadhub_core::config::worker::WorkerConfig;

/// Escalating delay table applied between delivery attempts.
///
/// Attempt numbers past the end of the table use the last entry, so the
/// delay sequence is non-decreasing and capped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Build a policy from a delay table in seconds. An empty table
    /// falls back to the default.
    pub fn new(delay_seconds: &[u64]) -> Self {
        if delay_seconds.is_empty() {
            return Self::default();
        }
        Self {
            delays: delay_seconds
                .iter()
                .map(|s| Duration::seconds(*s as i64))
                .collect(),
        }
    }

    /// Build a policy from the worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(&config.retry_delay_seconds)
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: i32) -> Duration {
        let index = (attempt.max(1) as usize - 1).min(self.delays.len() - 1);
        self.delays[index]
    }
}

impl Default for RetryPolicy {
    /// 60s, 5min, 15min, then capped at 1h.
    fn default() -> Self {
        Self {
            delays: vec![
                Duration::seconds(60),
                Duration::seconds(300),
                Duration::seconds(900),
                Duration::seconds(3600),
            ],
        }
    }
}
