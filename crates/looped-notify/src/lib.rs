//! # looped-notify
//!
//! Delivery of staff invite codes and password reset tokens.
//!
//! The staff service only sees the [`NotificationGateway`] trait. Two
//! gateways ship with the crate: SMTP through lettre, and a log-only
//! gateway for local development.

pub mod gateway;
pub mod log;
pub mod smtp;
pub mod template;

use std::sync::Arc;

use looped_core::config::{MailConfig, MailTransport};
use looped_core::result::AppResult;

pub use gateway::{NotificationGateway, SendMailConfig};
pub use log::LogGateway;
pub use smtp::SmtpGateway;
pub use template::{MailTemplate, RenderedMail};

/// Build the gateway selected by configuration.
pub fn build_gateway(config: &MailConfig) -> AppResult<Arc<dyn NotificationGateway>> {
    match config.transport {
        MailTransport::Smtp => Ok(Arc::new(SmtpGateway::new(config)?)),
        MailTransport::Log => Ok(Arc::new(LogGateway::new(config))),
    }
}
