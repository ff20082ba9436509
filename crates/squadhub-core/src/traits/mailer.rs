//! Mail transport contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// SMTP priority mapped onto the `X-Priority` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailPriority {
    /// Normal delivery priority.
    Normal,
    /// High delivery priority (urgent notifications).
    High,
}

/// One outgoing email message.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
    /// Plain-text body.
    pub text: String,
    /// Delivery priority.
    pub priority: MailPriority,
}

/// SMTP-compatible mail transport.
///
/// Implementations hold a bounded connection pool shared by immediate and
/// digest sends. Errors propagate as dispatch failures subject to retry.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug + 'static {
    /// Send one message, returning the message id.
    async fn send(&self, email: OutgoingEmail) -> AppResult<String>;
}
