//! Web Push provider contract.

use async_trait::async_trait;
use thiserror::Error;

/// Web Push urgency hint forwarded to the push service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushUrgency {
    /// Deliver opportunistically.
    Normal,
    /// Deliver immediately (urgent notifications).
    High,
}

/// The endpoint and keys of one browser push subscription.
#[derive(Debug, Clone)]
pub struct PushTarget {
    /// Push service endpoint URL.
    pub endpoint: String,
    /// Client public key (P-256 ECDH).
    pub p256dh: String,
    /// Client auth secret.
    pub auth: String,
}

/// Per-message Web Push options.
#[derive(Debug, Clone)]
pub struct PushOptions {
    /// Message time-to-live in seconds.
    pub ttl_seconds: u32,
    /// Urgency hint.
    pub urgency: PushUrgency,
    /// Collapse/topic key; a newer message with the same topic replaces
    /// an older undelivered one.
    pub topic: Option<String>,
}

/// Error from a single Web Push send attempt.
///
/// The HTTP status is preserved so the subscription lifecycle can react:
/// 404/410 means the endpoint is permanently gone.
#[derive(Debug, Error)]
pub enum PushSendError {
    /// The push service reported the endpoint no longer exists.
    #[error("push endpoint gone (HTTP {status})")]
    EndpointGone {
        /// 404 or 410.
        status: u16,
    },
    /// Any other transport or provider failure.
    #[error("push transport error: {0}")]
    Transport(String),
}

/// VAPID-authenticated Web Push provider.
#[async_trait]
pub trait WebPushSender: Send + Sync + std::fmt::Debug + 'static {
    /// Send one payload to one subscription endpoint.
    async fn send(
        &self,
        target: &PushTarget,
        payload: &str,
        options: &PushOptions,
    ) -> Result<(), PushSendError>;
}
