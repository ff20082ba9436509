//! User directory configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external user directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Base URL of the user directory service.
    pub base_url: String,
    /// TTL for cached directory lookups, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_timeout() -> u64 {
    10
}
