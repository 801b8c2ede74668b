//! Staff role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission levels a staff member can hold.
///
/// Roles are ordered by privilege level:
/// Owner > Administrator > Editor > Author > Contributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "staff_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    /// The account that set the site up. Exactly one is expected.
    Owner,
    /// Manages staff and site settings.
    Administrator,
    /// Publishes and edits everyone's content.
    Editor,
    /// Publishes own content.
    Author,
    /// Drafts content for review.
    Contributor,
}

impl StaffRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Owner => 5,
            Self::Administrator => 4,
            Self::Editor => 3,
            Self::Author => 2,
            Self::Contributor => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &StaffRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Administrator => "administrator",
            Self::Editor => "editor",
            Self::Author => "author",
            Self::Contributor => "contributor",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = looped_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "administrator" | "admin" => Ok(Self::Administrator),
            "editor" => Ok(Self::Editor),
            "author" => Ok(Self::Author),
            "contributor" => Ok(Self::Contributor),
            _ => Err(looped_core::AppError::validation(format!(
                "Invalid staff role: '{s}'. Expected one of: owner, administrator, editor, author, contributor"
            ))),
        }
    }
}
