//! SMTP delivery through lettre.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use looped_core::config::MailConfig;
use looped_core::error::{AppError, ErrorKind};
use looped_core::result::AppResult;

use crate::gateway::{NotificationGateway, SendMailConfig};

/// Gateway sending multipart mail through an SMTP relay with STARTTLS.
#[derive(Clone)]
pub struct SmtpGateway {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    admin_url: String,
}

impl std::fmt::Debug for SmtpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpGateway")
            .field("from", &self.from.to_string())
            .field("admin_url", &self.admin_url)
            .finish()
    }
}

impl SmtpGateway {
    /// Create a gateway from configuration.
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let from: Mailbox = config.from_address.parse().map_err(|e| {
            AppError::configuration(format!(
                "Invalid sender address '{}': {e}",
                config.from_address
            ))
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Invalid SMTP relay '{}'", config.smtp_host),
                    e,
                )
            })?
            .port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            "SMTP notification gateway configured"
        );

        Ok(Self {
            mailer: builder.build(),
            from,
            admin_url: config.admin_url.clone(),
        })
    }
}

#[async_trait]
impl NotificationGateway for SmtpGateway {
    async fn send(&self, mail: &SendMailConfig) -> AppResult<()> {
        let to: Mailbox = mail.to.parse().map_err(|e| {
            AppError::notification_failed(format!("Invalid recipient address: {e}"))
        })?;
        let rendered = mail.template.render(&mail.to, &self.admin_url);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(rendered.text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(rendered.html),
                    ),
            )
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::NotificationFailed,
                    "Failed to build message",
                    e,
                )
            })?;

        self.mailer.send(message).await.map_err(|e| {
            AppError::with_source(ErrorKind::NotificationFailed, "SMTP delivery failed", e)
        })?;

        info!(to = %mail.to, kind = mail.template.kind(), "Staff mail sent");
        Ok(())
    }
}
