//! Delivery work item status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one delivery work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Waiting to be claimed by a consumer cycle.
    Pending,
    /// Claimed by a consumer cycle; dispatch in flight.
    Processing,
    /// Delivery succeeded (including intentional no-ops).
    Completed,
    /// Delivery failed. Re-claimable while the attempt budget lasts.
    Failed,
}

impl DeliveryStatus {
    /// Check if the item can be claimed again after a failure.
    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
