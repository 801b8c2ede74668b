//! Repository traits and their PostgreSQL implementations.

pub mod settings;
pub mod staff;

pub use settings::{PgSettingsRepository, SettingsRepository};
pub use staff::{PgStaffRepository, StaffRepository, Visibility};
