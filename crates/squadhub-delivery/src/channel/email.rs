//! Email channel sender — offline-only delivery through the pooled SMTP
//! transport.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use squadhub_core::traits::mailer::{Mailer, MailPriority, OutgoingEmail};
use squadhub_entity::notification::{ChannelKind, Notification, NotificationPriority};

use crate::directory::CachedDirectory;
use crate::presence::PresenceOracle;
use crate::template;

use super::{ChannelSender, DeliveryOutcome, DispatchError};

/// Sends one templated email per notification, but only when the
/// recipient would otherwise miss it.
#[derive(Debug)]
pub struct EmailSender {
    oracle: Arc<PresenceOracle>,
    directory: Arc<CachedDirectory>,
    mailer: Arc<dyn Mailer>,
}

impl EmailSender {
    /// Create a new email sender.
    pub fn new(
        oracle: Arc<PresenceOracle>,
        directory: Arc<CachedDirectory>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            oracle,
            directory,
            mailer,
        }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn deliver(&self, notification: &Notification) -> Result<DeliveryOutcome, DispatchError> {
        let offline = self
            .oracle
            .is_offline(notification.recipient_id)
            .await
            .map_err(|e| DispatchError::Transient(format!("presence lookup failed: {e}")))?;

        if !offline {
            debug!(
                "Recipient {} is reachable in-app, skipping email for {}",
                notification.recipient_id, notification.id
            );
            return Ok(DeliveryOutcome::Suppressed);
        }

        let Some(info) = self.directory.get_user_info(notification.recipient_id).await else {
            warn!(
                "No directory entry for {}, skipping email for {}",
                notification.recipient_id, notification.id
            );
            return Ok(DeliveryOutcome::NoDestination);
        };

        let Some(address) = info.email.clone() else {
            warn!(
                "No email address on file for {}, skipping email for {}",
                notification.recipient_id, notification.id
            );
            return Ok(DeliveryOutcome::NoDestination);
        };

        let content = template::render_email(notification, &info);
        let priority = if notification.priority == NotificationPriority::Urgent {
            MailPriority::High
        } else {
            MailPriority::Normal
        };

        let message_id = self
            .mailer
            .send(OutgoingEmail {
                to: address,
                subject: content.subject,
                html: content.html,
                text: content.text,
                priority,
            })
            .await
            .map_err(|e| DispatchError::Transient(format!("smtp send failed: {e}")))?;

        debug!(
            "Emailed notification {} to {} (message id {})",
            notification.id, notification.recipient_id, message_id
        );
        Ok(DeliveryOutcome::Delivered)
    }
}
