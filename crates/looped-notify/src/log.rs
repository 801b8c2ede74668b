//! Log-only gateway for local development.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use looped_core::config::MailConfig;
use looped_core::result::AppResult;

use crate::gateway::{NotificationGateway, SendMailConfig};

/// Gateway that records outgoing mail in the log instead of sending it.
///
/// The rendered body, which carries the plaintext code, is only written
/// at debug level.
#[derive(Debug, Clone)]
pub struct LogGateway {
    admin_url: String,
}

impl LogGateway {
    /// Create a log gateway.
    pub fn new(config: &MailConfig) -> Self {
        warn!("Mail transport is 'log'; staff mail will not be delivered");
        Self {
            admin_url: config.admin_url.clone(),
        }
    }
}

#[async_trait]
impl NotificationGateway for LogGateway {
    async fn send(&self, mail: &SendMailConfig) -> AppResult<()> {
        let rendered = mail.template.render(&mail.to, &self.admin_url);
        info!(
            to = %mail.to,
            kind = mail.template.kind(),
            subject = %rendered.subject,
            "Staff mail logged instead of sent"
        );
        debug!(to = %mail.to, body = %rendered.text, "Logged staff mail body");
        Ok(())
    }
}
