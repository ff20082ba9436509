//! Cron scheduler for the digest runs and the subscription sweep.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, error, info};

use squadhub_core::config::digest::DigestConfig;
use squadhub_core::error::AppError;
use squadhub_delivery::digest::{DigestAggregator, DigestPeriod};
use squadhub_delivery::subscription::PushSubscriptionRegistry;

/// Owns the cron jobs around the pipeline: daily and weekly digest runs
/// plus the stale push subscription sweep. Explicit `start`/`shutdown`
/// lifecycle; nothing fires until started.
pub struct PipelineScheduler {
    scheduler: JobScheduler,
    digest: Arc<DigestAggregator>,
    subscriptions: Arc<PushSubscriptionRegistry>,
    config: DigestConfig,
}

impl std::fmt::Debug for PipelineScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineScheduler").finish()
    }
}

impl PipelineScheduler {
    /// Create a new scheduler.
    pub async fn new(
        digest: Arc<DigestAggregator>,
        subscriptions: Arc<PushSubscriptionRegistry>,
        config: DigestConfig,
    ) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            digest,
            subscriptions,
            config,
        })
    }

    /// Register all default scheduled tasks.
    pub async fn register_default_tasks(&self) -> Result<(), AppError> {
        if self.config.enabled {
            self.register_digest(DigestPeriod::Daily, self.config.daily_cron.clone())
                .await?;
            self.register_digest(DigestPeriod::Weekly, self.config.weekly_cron.clone())
                .await?;
        } else {
            info!("Digest aggregation disabled, skipping digest schedules");
        }
        self.register_subscription_sweep().await?;

        info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!("Pipeline scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Pipeline scheduler shut down");
        Ok(())
    }

    /// Digest run on the configured cron expression.
    async fn register_digest(&self, period: DigestPeriod, cron: String) -> Result<(), AppError> {
        let digest = Arc::clone(&self.digest);
        let job = CronJob::new_async(cron.as_str(), move |_uuid, _lock| {
            let digest = Arc::clone(&digest);
            Box::pin(async move {
                debug!("Running {} digest aggregation", period.as_str());
                match digest.process_pending_digests(period).await {
                    Ok(summary) => {
                        debug!(
                            "{} digest finished: {} email(s) sent",
                            period.as_str(),
                            summary.emails_sent
                        );
                    }
                    Err(e) => error!("{} digest run failed: {e}", period.as_str()),
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to create {} digest schedule: {e}",
                period.as_str()
            ))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!(
                "Failed to add {} digest schedule: {e}",
                period.as_str()
            ))
        })?;

        info!("Registered: {} digest ({cron})", period.as_str());
        Ok(())
    }

    /// Stale subscription sweep — every day at 3 AM.
    async fn register_subscription_sweep(&self) -> Result<(), AppError> {
        let subscriptions = Arc::clone(&self.subscriptions);
        let job = CronJob::new_async("0 0 3 * * *", move |_uuid, _lock| {
            let subscriptions = Arc::clone(&subscriptions);
            Box::pin(async move {
                debug!("Running push subscription sweep");
                if let Err(e) = subscriptions.sweep_stale().await {
                    error!("Push subscription sweep failed: {e}");
                }
            })
        })
        .map_err(|e| {
            AppError::internal(format!("Failed to create subscription sweep schedule: {e}"))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add subscription sweep schedule: {e}"))
        })?;

        info!("Registered: subscription sweep (daily at 3AM)");
        Ok(())
    }
}
