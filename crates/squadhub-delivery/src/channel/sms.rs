//! SMS channel sender — placeholder with no backend.

use async_trait::async_trait;

use squadhub_entity::notification::{ChannelKind, Notification};

use super::{ChannelSender, DeliveryOutcome, DispatchError};

/// Keeps the work-item model uniform across channels while no SMS
/// provider is wired in. Every dispatch fails as unimplemented, which
/// the consumer fails permanently instead of burning the retry budget.
#[derive(Debug, Default)]
pub struct SmsSender;

impl SmsSender {
    /// Create the placeholder sender.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn channel(&self) -> ChannelKind {
        ChannelKind::Sms
    }

    async fn deliver(&self, _notification: &Notification) -> Result<DeliveryOutcome, DispatchError> {
        Err(DispatchError::Unimplemented("sms"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::test_support::notification_for;
    use squadhub_entity::notification::NotificationKind;

    #[tokio::test]
    async fn test_always_unimplemented() {
        let sender = SmsSender::new();
        let n = notification_for(NotificationKind::PaymentDue, ChannelKind::Sms);
        let err = sender.deliver(&n).await.unwrap_err();
        assert!(matches!(err, DispatchError::Unimplemented("sms")));
    }
}
