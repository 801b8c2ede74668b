//! Outbound mail configuration.

use serde::{Deserialize, Serialize};

/// Which notification gateway the server wires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Deliver through an SMTP relay.
    Smtp,
    /// Only log outgoing messages. Useful for local development.
    #[default]
    Log,
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Gateway selection.
    #[serde(default)]
    pub transport: MailTransport,
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default, skip_serializing)]
    pub smtp_password: String,
    /// Sender address for all staff mail.
    #[serde(default = "default_from")]
    pub from_address: String,
    /// Public URL of the admin dashboard, used in message bodies.
    #[serde(default = "default_admin_url")]
    pub admin_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: MailTransport::default(),
            smtp_host: String::new(),
            smtp_port: default_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_address: default_from(),
            admin_url: default_admin_url(),
        }
    }
}

fn default_port() -> u16 {
    587
}

fn default_from() -> String {
    "Looped CMS <no-reply@localhost>".to_string()
}

fn default_admin_url() -> String {
    "http://localhost:4200".to_string()
}
