//! Channel senders and the dispatch registry.
//!
//! Each delivery channel is one [`ChannelSender`] implementation held in
//! a [`ChannelRegistry`] keyed by channel kind, so the queue consumer
//! dispatches through a lookup instead of scattering channel checks.

pub mod email;
pub mod in_app;
pub mod push;
pub mod sms;

#[cfg(test)]
pub(crate) mod test_support;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use squadhub_entity::notification::{ChannelKind, Notification};

/// Successful result of one channel dispatch.
///
/// Presence suppression and missing destinations are successes, not
/// failures: the intent "notify only if they'd otherwise miss it" was
/// honored, and there is nothing to retry toward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The message went out.
    Delivered,
    /// The recipient is reachable in-app; email/push skipped.
    Suppressed,
    /// No address or no subscriptions to send to.
    NoDestination,
    /// Push fan-out with at least one successful send.
    PartialPush {
        /// Subscriptions delivered to.
        sent: usize,
        /// Subscriptions that failed.
        failed: usize,
    },
}

/// Failed result of one channel dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Transport-level failure; worth retrying.
    #[error("transient delivery failure: {0}")]
    Transient(String),
    /// The item can never succeed (e.g. orphan notification).
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
    /// The channel is not set up. Surfaces per-item and follows the
    /// generic retry policy, matching the recorded source behavior.
    #[error("channel misconfigured: {0}")]
    Configuration(String),
    /// The channel has no backend at all. Never retried.
    #[error("channel '{0}' is not implemented")]
    Unimplemented(&'static str),
}

/// One delivery strategy for one channel.
#[async_trait]
pub trait ChannelSender: Send + Sync + std::fmt::Debug {
    /// The channel this sender serves.
    fn channel(&self) -> ChannelKind;

    /// Attempt delivery of one notification.
    async fn deliver(&self, notification: &Notification) -> Result<DeliveryOutcome, DispatchError>;
}

/// Lookup table of channel senders keyed by channel kind.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    senders: HashMap<ChannelKind, Arc<dyn ChannelSender>>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            senders: HashMap::new(),
        }
    }

    /// Register a channel sender.
    pub fn register(&mut self, sender: Arc<dyn ChannelSender>) {
        let channel = sender.channel();
        info!("Registered channel sender for '{}'", channel);
        self.senders.insert(channel, sender);
    }

    /// Look up the sender for a channel.
    pub fn get(&self, channel: ChannelKind) -> Option<Arc<dyn ChannelSender>> {
        self.senders.get(&channel).cloned()
    }

    /// The channels with a registered sender.
    pub fn registered(&self) -> Vec<ChannelKind> {
        self.senders.keys().copied().collect()
    }
}
