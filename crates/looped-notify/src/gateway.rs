//! Notification gateway contract.

use async_trait::async_trait;

use looped_core::result::AppResult;

use crate::template::MailTemplate;

/// A message addressed to one staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMailConfig {
    /// Recipient address.
    pub to: String,
    /// Message kind and its variable parts.
    pub template: MailTemplate,
}

impl SendMailConfig {
    /// Create a message for `to`.
    pub fn new(to: impl Into<String>, template: MailTemplate) -> Self {
        Self {
            to: to.into(),
            template,
        }
    }
}

/// Outbound channel for staff notifications.
///
/// Failures are reported as `NotificationFailed`; the caller decides what
/// a failed delivery means for the record it was sent about.
#[async_trait]
pub trait NotificationGateway: Send + Sync + 'static {
    /// Deliver one message.
    async fn send(&self, mail: &SendMailConfig) -> AppResult<()>;
}
