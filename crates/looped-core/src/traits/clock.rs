//! Time source abstraction.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
///
/// Every expiry decision in the staff lifecycle reads the time through this
/// trait so that invite and reset windows can be checked at exact instants.
pub trait Clock: Send + Sync + 'static {
    /// Return the current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
