//! Shared value types.

pub mod id;
pub mod pagination;

pub use id::{SessionId, StaffId};
pub use pagination::{PageRequest, PageResponse};
