//! Outbound SMTP configuration.

use serde::{Deserialize, Serialize};

/// Pooled SMTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay hostname.
    pub host: String,
    /// SMTP relay port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: String,
    /// SMTP password.
    #[serde(default)]
    pub password: String,
    /// Sender address for all outgoing mail.
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Maximum pooled connections to the relay.
    #[serde(default = "default_pool_size")]
    pub pool_max_connections: u32,
}

fn default_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Squadhub".to_string()
}

fn default_pool_size() -> u32 {
    5
}
