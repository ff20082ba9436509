//! Shared doubles for channel sender tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use squadhub_core::config::directory::DirectoryConfig;
use squadhub_core::config::presence::PresenceConfig;
use squadhub_core::error::AppError;
use squadhub_core::result::AppResult;
use squadhub_core::traits::clock::SystemClock;
use squadhub_core::traits::directory::{UserDirectory, UserInfo};
use squadhub_core::traits::mailer::{Mailer, OutgoingEmail};
use squadhub_database::store::PresenceStore;
use squadhub_entity::notification::{
    ChannelKind, NewNotification, Notification, NotificationKind, NotificationPriority,
};
use squadhub_entity::presence::{PresenceRecord, PresenceStatus};

use crate::directory::CachedDirectory;
use crate::presence::PresenceOracle;

/// Mailer that records sent messages, optionally failing every send.
#[derive(Debug, Default)]
pub struct MockMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl MockMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<String> {
        if self.fail {
            return Err(AppError::external_service("smtp connection refused"));
        }
        self.sent.lock().unwrap().push(email);
        Ok(format!("<{}@test>", Uuid::new_v4()))
    }
}

/// Presence store with no records: every user counts as offline.
#[derive(Debug)]
struct NoPresence;

#[async_trait]
impl PresenceStore for NoPresence {
    async fn find_by_user(&self, _user_id: Uuid) -> AppResult<Option<PresenceRecord>> {
        Ok(None)
    }
}

/// Presence store that reports every user online right now.
#[derive(Debug)]
struct AllOnline;

#[async_trait]
impl PresenceStore for AllOnline {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<PresenceRecord>> {
        let now = Utc::now();
        Ok(Some(PresenceRecord {
            user_id,
            status: PresenceStatus::Online,
            last_seen_at: now,
            away_since: None,
            busy_until: None,
            updated_at: now,
        }))
    }
}

/// Oracle that treats every recipient as offline.
pub fn offline_oracle() -> Arc<PresenceOracle> {
    Arc::new(PresenceOracle::new(
        Arc::new(NoPresence),
        Arc::new(SystemClock),
        &PresenceConfig::default(),
    ))
}

/// Oracle that treats every recipient as reachable.
pub fn online_oracle() -> Arc<PresenceOracle> {
    Arc::new(PresenceOracle::new(
        Arc::new(AllOnline),
        Arc::new(SystemClock),
        &PresenceConfig::default(),
    ))
}

/// Directory that returns the same profile for every user.
#[derive(Debug)]
pub struct StaticDirectory {
    info: Option<UserInfo>,
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn get_user_info(&self, _user_id: Uuid) -> AppResult<Option<UserInfo>> {
        Ok(self.info.clone())
    }
}

impl StaticDirectory {
    /// A cached directory resolving every user to the given address.
    pub fn with_email(address: &str) -> Arc<CachedDirectory> {
        Self::cached(Some(UserInfo {
            email: Some(address.to_string()),
            first_name: "Alex".to_string(),
            last_name: "Keeper".to_string(),
            timezone: None,
        }))
    }

    /// A cached directory resolving every user, but with no address on file.
    pub fn without_email() -> Arc<CachedDirectory> {
        Self::cached(Some(UserInfo {
            email: None,
            first_name: "Alex".to_string(),
            last_name: "Keeper".to_string(),
            timezone: None,
        }))
    }

    fn cached(info: Option<UserInfo>) -> Arc<CachedDirectory> {
        let config = DirectoryConfig {
            base_url: "http://directory.local".to_string(),
            cache_ttl_seconds: 300,
            request_timeout_seconds: 10,
        };
        Arc::new(CachedDirectory::new(
            Arc::new(StaticDirectory { info }),
            &config,
            Arc::new(SystemClock),
        ))
    }
}

/// A notification targeting one channel, with test-friendly content.
pub fn notification_for(kind: NotificationKind, channel: ChannelKind) -> Notification {
    NewNotification {
        recipient_id: Uuid::new_v4(),
        organization_id: None,
        team_id: None,
        kind,
        title: "Tuesday session".to_string(),
        message: "Moved to 7pm at the east pitch.".to_string(),
        action_url: None,
        action_text: None,
        priority: NotificationPriority::Medium,
        channels: vec![channel],
        metadata: serde_json::Value::Null,
    }
    .into_notification(Utc::now())
}
