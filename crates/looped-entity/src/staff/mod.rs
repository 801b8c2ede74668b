//! Staff domain entities.

pub mod code;
pub mod model;
pub mod role;
pub mod state;

pub use code::TimedCode;
pub use model::{NewStaff, StaffMember, StaffPatch};
pub use role::StaffRole;
pub use state::StaffState;
