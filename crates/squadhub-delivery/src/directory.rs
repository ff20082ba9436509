//! User directory access with a TTL cache in front.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use tracing::warn;
use uuid::Uuid;

use squadhub_core::config::directory::DirectoryConfig;
use squadhub_core::error::{AppError, ErrorKind};
use squadhub_core::result::AppResult;
use squadhub_core::traits::clock::Clock;
use squadhub_core::traits::directory::{UserDirectory, UserInfo};

use crate::cache::TtlCache;

/// HTTP client for the external user directory service.
#[derive(Debug, Clone)]
pub struct HttpUserDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserDirectory {
    /// Create a directory client from configuration.
    pub fn new(config: &DirectoryConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build directory HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn get_user_info(&self, user_id: Uuid) -> AppResult<Option<UserInfo>> {
        let url = format!("{}/users/{}", self.base_url, user_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Directory lookup failed for {user_id}"),
                e,
            )
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status().map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Directory returned an error for {user_id}"),
                e,
            )
        })?;

        let info = response.json::<UserInfo>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Directory returned malformed user info for {user_id}"),
                e,
            )
        })?;

        Ok(Some(info))
    }
}

/// TTL-cached wrapper over the user directory.
///
/// Lookups are cached per user id to bound directory load during delivery
/// bursts. Directory failures are downgraded to "no contact info" and are
/// not cached, so a transient outage heals on the next lookup.
#[derive(Debug)]
pub struct CachedDirectory {
    inner: Arc<dyn UserDirectory>,
    cache: TtlCache<Uuid, Option<UserInfo>>,
}

impl CachedDirectory {
    /// Wrap a directory with a cache of the given TTL.
    pub fn new(inner: Arc<dyn UserDirectory>, config: &DirectoryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            cache: TtlCache::new(Duration::seconds(config.cache_ttl_seconds as i64), clock),
        }
    }

    /// Resolve a user's contact info, consulting the cache first.
    pub async fn get_user_info(&self, user_id: Uuid) -> Option<UserInfo> {
        if let Some(cached) = self.cache.get(&user_id) {
            return cached;
        }

        match self.inner.get_user_info(user_id).await {
            Ok(info) => {
                self.cache.insert(user_id, info.clone());
                info
            }
            Err(e) => {
                warn!("Directory lookup failed for {user_id}, treating as no contact info: {e}");
                None
            }
        }
    }
}
