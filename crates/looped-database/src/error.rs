//! Translation of sqlx errors into application errors.

use looped_core::error::{AppError, ErrorKind};

/// Name of the partial unique index guarding live staff emails.
pub const STAFF_EMAIL_INDEX: &str = "staff_live_email_key";

/// Map a sqlx error to an [`AppError`], classifying transient failures as
/// `Unavailable` and email index violations as `DuplicateEmail`.
pub fn map_sqlx_error(err: sqlx::Error, context: &str) -> AppError {
    let kind = match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            ErrorKind::Unavailable
        }
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            if db_err.constraint() == Some(STAFF_EMAIL_INDEX) {
                ErrorKind::DuplicateEmail
            } else {
                ErrorKind::Conflict
            }
        }
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        _ => ErrorKind::Database,
    };

    let message = match kind {
        ErrorKind::DuplicateEmail => "Email is already in use".to_string(),
        _ => format!("{context}: {err}"),
    };
    AppError::with_source(kind, message, err)
}
