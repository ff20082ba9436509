//! Delivery channel enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A delivery mechanism for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "channel_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Real-time in-app delivery over the socket transport.
    InApp,
    /// Email delivery for offline users.
    Email,
    /// SMS delivery (no backend configured).
    Sms,
    /// Web Push delivery for offline users.
    Push,
}

impl ChannelKind {
    /// All channels, in dispatch registration order.
    pub const ALL: [ChannelKind; 4] = [Self::InApp, Self::Email, Self::Sms, Self::Push];

    /// Return the channel as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InApp => "in_app",
            Self::Email => "email",
            Self::Sms => "sms",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
