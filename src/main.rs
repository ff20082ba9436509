//! Squadhub Notifier — notification delivery pipeline service
//!
//! Main entry point that wires the stores, channel senders, queue
//! consumer, and digest scheduler together.

use std::sync::Arc;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{fmt, EnvFilter};

use squadhub_core::config::AppConfig;
use squadhub_core::error::AppError;
use squadhub_core::traits::clock::{Clock, SystemClock};

#[tokio::main]
async fn main() {
    let env = std::env::var("SQUADHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Notifier error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Squadhub notifier v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    tracing::info!("Connecting to database...");
    let db = squadhub_database::connection::DatabasePool::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    squadhub_database::migration::run_migrations(db.pool()).await?;
    tracing::info!("Database migrations complete");

    // ── Step 2: Initialize repositories ──────────────────────────
    let notification_repo = Arc::new(
        squadhub_database::repositories::notification::NotificationRepository::new(
            db.pool().clone(),
        ),
    );
    let delivery_repo = Arc::new(
        squadhub_database::repositories::delivery::DeliveryRepository::new(db.pool().clone()),
    );
    let presence_repo = Arc::new(
        squadhub_database::repositories::presence::PresenceRepository::new(db.pool().clone()),
    );
    let subscription_repo = Arc::new(
        squadhub_database::repositories::push_subscription::PushSubscriptionRepository::new(
            db.pool().clone(),
        ),
    );

    // ── Step 3: Initialize outbound providers ────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    tracing::info!("Initializing SMTP transport (relay: {})...", config.smtp.host);
    let mailer = Arc::new(squadhub_delivery::smtp::SmtpMailer::new(&config.smtp)?);

    tracing::info!("Initializing Web Push client...");
    let push_sender = Arc::new(squadhub_delivery::webpush::VapidPushSender::new(
        &config.push,
    )?);

    let directory = Arc::new(squadhub_delivery::directory::HttpUserDirectory::new(
        &config.directory,
    )?);
    let cached_directory = Arc::new(squadhub_delivery::directory::CachedDirectory::new(
        directory,
        &config.directory,
        Arc::clone(&clock),
    ));

    // ── Step 4: Presence oracle and channel senders ──────────────
    let oracle = Arc::new(squadhub_delivery::presence::PresenceOracle::new(
        presence_repo,
        Arc::clone(&clock),
        &config.presence,
    ));

    // The socket server lives in the main application process; this
    // service has no transport wired in, so in-app items surface a
    // per-item configuration failure.
    tracing::warn!("Real-time channel not available; in-app deliveries will fail");
    let mut channels = squadhub_delivery::channel::ChannelRegistry::new();
    channels.register(Arc::new(squadhub_delivery::channel::in_app::InAppSender::new(None)));
    channels.register(Arc::new(squadhub_delivery::channel::email::EmailSender::new(
        Arc::clone(&oracle),
        Arc::clone(&cached_directory),
        mailer.clone(),
    )));
    channels.register(Arc::new(
        squadhub_delivery::channel::push::PushChannelSender::new(
            Arc::clone(&oracle),
            subscription_repo.clone(),
            push_sender,
            Arc::clone(&clock),
            config.push.ttl_seconds,
            config.push.fanout_concurrency,
        ),
    ));
    channels.register(Arc::new(squadhub_delivery::channel::sms::SmsSender::new()));
    let channels = Arc::new(channels);

    // ── Step 5: Digest aggregator and subscription registry ──────
    let digest = Arc::new(squadhub_delivery::digest::DigestAggregator::new(
        notification_repo.clone(),
        Arc::clone(&cached_directory),
        mailer,
        Arc::clone(&clock),
        config.digest.clone(),
    ));
    let subscriptions = Arc::new(squadhub_delivery::subscription::PushSubscriptionRegistry::new(
        subscription_repo,
        Arc::clone(&clock),
        &config.push,
    ));

    // ── Step 6: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 7: Start the queue consumer ─────────────────────────
    let consumer_handle = if config.worker.enabled {
        tracing::info!("Starting delivery consumer...");
        let consumer = squadhub_worker::consumer::DeliveryConsumer::new(
            delivery_repo,
            notification_repo,
            channels,
            Arc::clone(&clock),
            config.worker.clone(),
        );

        let consumer_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            consumer.run(consumer_cancel).await;
        });

        tracing::info!("Delivery consumer started");
        Some(handle)
    } else {
        tracing::info!("Delivery consumer disabled");
        None
    };

    // ── Step 8: Start the cron scheduler ─────────────────────────
    let scheduler =
        squadhub_worker::scheduler::PipelineScheduler::new(digest, subscriptions, config.digest.clone())
            .await?;
    scheduler.register_default_tasks().await?;
    scheduler.start().await?;

    tracing::info!("Squadhub notifier running");

    // ── Step 9: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);

    scheduler.shutdown().await?;

    if let Some(handle) = consumer_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(30), handle).await;
    }

    db.close().await;
    tracing::info!("Squadhub notifier shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
