//! In-memory repository implementations.
//!
//! Used by tests and by single-process deployments that do not need
//! durability. They honour the same contracts as the PostgreSQL
//! repositories.

pub mod settings;
pub mod staff;

pub use settings::MemorySettingsRepository;
pub use staff::MemoryStaffRepository;
