//! Message bodies for staff notifications.

use looped_entity::staff::StaffRole;

/// The kinds of mail the staff lifecycle sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailTemplate {
    /// Invitation to join the back office.
    StaffInvite {
        /// Plaintext invite code.
        code: String,
        /// Role the invitee will hold.
        role: StaffRole,
    },
    /// Password reset link.
    PasswordReset {
        /// Plaintext reset token.
        code: String,
    },
}

/// A rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl MailTemplate {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StaffInvite { .. } => "staff_invite",
            Self::PasswordReset { .. } => "password_reset",
        }
    }

    /// Render subject and bodies, linking into the admin dashboard.
    pub fn render(&self, to: &str, admin_url: &str) -> RenderedMail {
        let base = admin_url.trim_end_matches('/');
        match self {
            Self::StaffInvite { code, role } => {
                let link = format!("{base}/signup?email={to}&code={code}");
                RenderedMail {
                    subject: "You have been invited to Looped".to_string(),
                    text: format!(
                        "You have been invited to join Looped as {role}.\n\n\
                         Accept the invitation and choose a password here:\n{link}\n\n\
                         The link is only valid for a limited time."
                    ),
                    html: format!(
                        "<p>You have been invited to join Looped as <strong>{role}</strong>.</p>\
                         <p><a href=\"{link}\">Accept the invitation</a></p>\
                         <p>The link is only valid for a limited time.</p>"
                    ),
                }
            }
            Self::PasswordReset { code } => {
                let link = format!("{base}/reset-password?email={to}&token={code}");
                RenderedMail {
                    subject: "Reset your Looped password".to_string(),
                    text: format!(
                        "Someone asked to reset the password of your Looped account.\n\n\
                         Choose a new password here:\n{link}\n\n\
                         If this was not you, ignore this message."
                    ),
                    html: format!(
                        "<p>Someone asked to reset the password of your Looped account.</p>\
                         <p><a href=\"{link}\">Choose a new password</a></p>\
                         <p>If this was not you, ignore this message.</p>"
                    ),
                }
            }
        }
    }
}
