//! VAPID Web Push provider backed by the web-push crate.

use async_trait::async_trait;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, Urgency, VapidSignatureBuilder,
    WebPushClient, WebPushError, WebPushMessageBuilder, URL_SAFE_NO_PAD,
};

use squadhub_core::config::push::PushConfig;
use squadhub_core::error::AppError;
use squadhub_core::result::AppResult;
use squadhub_core::traits::push::{PushOptions, PushSendError, PushTarget, PushUrgency, WebPushSender};

/// Web Push sender authenticating with the configured VAPID key pair.
pub struct VapidPushSender {
    client: IsahcWebPushClient,
    vapid_subject: String,
    vapid_private_key: String,
}

impl VapidPushSender {
    /// Build the sender. Missing VAPID configuration fails fast here,
    /// at startup, rather than per item.
    pub fn new(config: &PushConfig) -> AppResult<Self> {
        if config.vapid_subject.is_empty() || config.vapid_private_key.is_empty() {
            return Err(AppError::configuration("VAPID subject/keys not configured"));
        }

        let client = IsahcWebPushClient::new().map_err(|e| {
            AppError::with_source(
                squadhub_core::error::ErrorKind::Configuration,
                "Failed to create web push client",
                e,
            )
        })?;

        Ok(Self {
            client,
            vapid_subject: config.vapid_subject.clone(),
            vapid_private_key: config.vapid_private_key.clone(),
        })
    }
}

impl std::fmt::Debug for VapidPushSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidPushSender")
            .field("vapid_subject", &self.vapid_subject)
            .finish()
    }
}

#[async_trait]
impl WebPushSender for VapidPushSender {
    async fn send(
        &self,
        target: &PushTarget,
        payload: &str,
        options: &PushOptions,
    ) -> Result<(), PushSendError> {
        let subscription = SubscriptionInfo::new(
            target.endpoint.clone(),
            target.p256dh.clone(),
            target.auth.clone(),
        );

        let mut signature =
            VapidSignatureBuilder::from_base64(&self.vapid_private_key, URL_SAFE_NO_PAD, &subscription)
                .map_err(|e| PushSendError::Transport(format!("invalid VAPID key: {e}")))?;
        signature.add_claim("sub", self.vapid_subject.as_str());
        let signature = signature
            .build()
            .map_err(|e| PushSendError::Transport(format!("VAPID signing failed: {e}")))?;

        let mut builder = WebPushMessageBuilder::new(&subscription);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload.as_bytes());
        builder.set_ttl(options.ttl_seconds);
        builder.set_urgency(match options.urgency {
            PushUrgency::High => Urgency::High,
            PushUrgency::Normal => Urgency::Normal,
        });
        if let Some(topic) = &options.topic {
            builder.set_topic(topic.clone());
        }
        builder.set_vapid_signature(signature);

        let message = builder
            .build()
            .map_err(|e| PushSendError::Transport(format!("failed to build push message: {e}")))?;

        self.client.send(message).await.map_err(|e| match e {
            WebPushError::EndpointNotFound => PushSendError::EndpointGone { status: 404 },
            WebPushError::EndpointNotValid => PushSendError::EndpointGone { status: 410 },
            other => PushSendError::Transport(other.to_string()),
        })
    }
}
