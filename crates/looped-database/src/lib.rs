//! # looped-database
//!
//! PostgreSQL connection management, embedded migrations, and the staff and
//! settings repositories. Each repository is a trait with a Postgres
//! implementation and an in-memory implementation sharing the same
//! contract.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use memory::{MemorySettingsRepository, MemoryStaffRepository};
pub use repositories::{
    PgSettingsRepository, PgStaffRepository, SettingsRepository, StaffRepository, Visibility,
};
