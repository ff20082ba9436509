//! Pooled SMTP mailer backed by lettre.

use async_trait::async_trait;
use lettre::message::header::{Header, HeaderName, HeaderValue};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use uuid::Uuid;

use squadhub_core::config::smtp::SmtpConfig;
use squadhub_core::error::{AppError, ErrorKind};
use squadhub_core::result::AppResult;
use squadhub_core::traits::mailer::{Mailer, MailPriority, OutgoingEmail};

/// `X-Priority` header; "1" marks urgent mail for most clients.
#[derive(Debug, Clone)]
struct XPriority(String);

impl Header for XPriority {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Priority")
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// Mailer over a bounded STARTTLS connection pool. The pool is shared by
/// immediate deliveries and digest runs; callers queue on it naturally.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the pooled transport from configuration.
    pub fn new(config: &SmtpConfig) -> AppResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid SMTP relay '{}'", config.host),
                    e,
                )
            })?
            .port(config.port)
            .pool_config(PoolConfig::new().max_size(config.pool_max_connections));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid sender address '{}'", config.from_address),
                    e,
                )
            })?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from).finish()
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> AppResult<String> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                AppError::with_source(
                    ErrorKind::Validation,
                    format!("Invalid recipient address '{}'", email.to),
                    e,
                )
            })?;

        let message_id = format!("<{}@squadhub.app>", Uuid::new_v4());
        let priority = match email.priority {
            MailPriority::High => "1",
            MailPriority::Normal => "3",
        };

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .message_id(Some(message_id.clone()))
            .header(XPriority(priority.to_string()))
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to build email message", e)
            })?;

        self.transport.send(message).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("SMTP send failed: {e}"),
                e,
            )
        })?;

        Ok(message_id)
    }
}
