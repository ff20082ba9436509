//! User directory contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::result::AppResult;

/// Contact and profile information resolved from the user directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// Primary email address, if the user has one on file.
    pub email: Option<String>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// IANA timezone identifier, if known.
    pub timezone: Option<String>,
}

impl UserInfo {
    /// Full display name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// External user directory service.
///
/// Lookups are network calls; callers cache results. A failed lookup is
/// treated as "no contact info", not as a delivery failure.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve a user's contact info. Returns `None` for unknown users.
    async fn get_user_info(&self, user_id: Uuid) -> AppResult<Option<UserInfo>>;
}
