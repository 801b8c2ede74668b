//! Staff lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

use looped_core::AppError;

/// Lifecycle state of a staff record.
///
/// ```text
/// Pending ──accept──▶ Active
///    │                  │
///    └──delete──▶ Deleted ◀──delete──┘
/// ```
///
/// `Deleted` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "staff_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StaffState {
    /// Invite issued, not yet accepted.
    Pending,
    /// Password set, account usable.
    Active,
    /// Soft-deleted. Retained for audit only.
    Deleted,
}

impl StaffState {
    /// Whether `self -> next` is an allowed lifecycle transition.
    pub fn can_transition_to(&self, next: StaffState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Pending, Self::Deleted)
                | (Self::Active, Self::Deleted)
        )
    }

    /// Validate a transition, returning the target state.
    pub fn transition(&self, next: StaffState) -> Result<StaffState, AppError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::conflict(format!(
                "Staff cannot move from {self} to {next}"
            )))
        }
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for StaffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
