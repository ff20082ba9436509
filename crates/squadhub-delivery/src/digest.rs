//! Time-windowed digest aggregation.
//!
//! Instead of one email per notification, users who accumulate enough
//! unread notifications over a trailing window get a single summary
//! email. Digests bypass the presence check: they summarize a past
//! window, so current reachability is irrelevant.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use squadhub_core::config::digest::DigestConfig;
use squadhub_core::result::AppResult;
use squadhub_core::traits::clock::Clock;
use squadhub_core::traits::mailer::{Mailer, MailPriority, OutgoingEmail};
use squadhub_database::store::NotificationStore;
use squadhub_entity::notification::Notification;

use crate::directory::CachedDirectory;

/// The trailing window a digest run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestPeriod {
    /// The last 24 hours.
    Daily,
    /// The last 7 days.
    Weekly,
}

impl DigestPeriod {
    /// Length of the trailing window.
    pub fn window(&self) -> Duration {
        match self {
            Self::Daily => Duration::days(1),
            Self::Weekly => Duration::days(7),
        }
    }

    /// Return the period as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

/// Counters from one digest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestRunSummary {
    /// Recipients with at least one qualifying notification.
    pub recipients_considered: usize,
    /// Digest emails sent.
    pub emails_sent: usize,
    /// Recipients dropped for being below the minimum threshold.
    pub below_threshold: usize,
    /// Recipients skipped because no address could be resolved.
    pub no_contact: usize,
    /// Recipients whose send failed.
    pub failures: usize,
}

/// Batches a user's unread, not-yet-digested notifications into one email.
#[derive(Debug)]
pub struct DigestAggregator {
    notifications: Arc<dyn NotificationStore>,
    directory: Arc<CachedDirectory>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    config: DigestConfig,
}

impl DigestAggregator {
    /// Create a new digest aggregator.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        directory: Arc<CachedDirectory>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: DigestConfig,
    ) -> Self {
        Self {
            notifications,
            directory,
            mailer,
            clock,
            config,
        }
    }

    /// Run one digest pass over the period's trailing window.
    ///
    /// Recipients below the minimum-count threshold are dropped; their
    /// notifications stay on the individual delivery path. One
    /// recipient's failure never aborts the batch.
    pub async fn process_pending_digests(&self, period: DigestPeriod) -> AppResult<DigestRunSummary> {
        let cutoff = self.clock.now() - period.window();
        let candidates = self.notifications.list_digest_candidates(cutoff).await?;

        let mut by_recipient: BTreeMap<Uuid, Vec<Notification>> = BTreeMap::new();
        for notification in candidates {
            by_recipient
                .entry(notification.recipient_id)
                .or_default()
                .push(notification);
        }

        let mut summary = DigestRunSummary {
            recipients_considered: by_recipient.len(),
            ..Default::default()
        };

        for (recipient_id, notifications) in by_recipient {
            if notifications.len() < self.config.min_notifications {
                summary.below_threshold += 1;
                continue;
            }

            let Some(info) = self.directory.get_user_info(recipient_id).await else {
                warn!("No directory entry for {recipient_id}, skipping digest");
                summary.no_contact += 1;
                continue;
            };
            let Some(address) = info.email.clone() else {
                warn!("No email address on file for {recipient_id}, skipping digest");
                summary.no_contact += 1;
                continue;
            };

            let email = self.render_digest(&address, &info.first_name, &notifications, period);
            match self.mailer.send(email).await {
                Ok(message_id) => {
                    let ids: Vec<Uuid> = notifications.iter().map(|n| n.id).collect();
                    if let Err(e) = self.notifications.mark_digest_sent(&ids).await {
                        warn!("Failed to flag digested notifications for {recipient_id}: {e}");
                    }
                    info!(
                        "Sent {} digest with {} notifications to {recipient_id} (message id {message_id})",
                        period.as_str(),
                        notifications.len()
                    );
                    summary.emails_sent += 1;
                }
                Err(e) => {
                    warn!("Digest send to {recipient_id} failed: {e}");
                    summary.failures += 1;
                }
            }

            // Provider rate limits: space consecutive sends out.
            if self.config.inter_message_delay_ms > 0 {
                tokio::time::sleep(StdDuration::from_millis(self.config.inter_message_delay_ms))
                    .await;
            }
        }

        info!(
            "{} digest run complete: considered={}, sent={}, below_threshold={}, no_contact={}, failures={}",
            period.as_str(),
            summary.recipients_considered,
            summary.emails_sent,
            summary.below_threshold,
            summary.no_contact,
            summary.failures
        );
        Ok(summary)
    }

    /// Render one digest email: notifications grouped by kind, at most
    /// `max_items_per_kind` titles each, with a "+N more" line beyond.
    fn render_digest(
        &self,
        address: &str,
        first_name: &str,
        notifications: &[Notification],
        period: DigestPeriod,
    ) -> OutgoingEmail {
        let mut by_kind: BTreeMap<&'static str, Vec<&Notification>> = BTreeMap::new();
        for notification in notifications {
            by_kind
                .entry(notification.kind.as_str())
                .or_default()
                .push(notification);
        }

        let subject = format!(
            "Your {} Squadhub digest ({} updates)",
            period.as_str(),
            notifications.len()
        );

        let mut html_sections = String::new();
        let mut text_sections = String::new();
        for (kind, items) in &by_kind {
            let heading = kind.replace('_', " ");
            html_sections.push_str(&format!("<h3>{heading} ({})</h3><ul>", items.len()));
            text_sections.push_str(&format!("\n{heading} ({})\n", items.len()));

            for item in items.iter().take(self.config.max_items_per_kind) {
                html_sections.push_str(&format!("<li>{}</li>", item.title));
                text_sections.push_str(&format!("  - {}\n", item.title));
            }
            if items.len() > self.config.max_items_per_kind {
                let more = items.len() - self.config.max_items_per_kind;
                html_sections.push_str(&format!("<li>+{more} more</li>"));
                text_sections.push_str(&format!("  +{more} more\n"));
            }
            html_sections.push_str("</ul>");
        }

        let html = format!(
            "<html><body><p>Hi {first_name},</p>\
             <p>Here is what you missed:</p>\
             {html_sections}\
             <p>— Squadhub</p></body></html>"
        );
        let text = format!("Hi {first_name},\n\nHere is what you missed:\n{text_sections}\n— Squadhub\n");

        OutgoingEmail {
            to: address.to_string(),
            subject,
            html,
            text,
            priority: MailPriority::Normal,
        }
    }
}
