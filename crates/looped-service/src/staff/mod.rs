//! Staff account lifecycle.

pub mod password;
pub mod policy;
pub mod requests;
pub mod service;
pub mod session;

pub use policy::StaffPolicy;
pub use requests::{
    AcceptInviteRequest, ChangePasswordRequest, InviteRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, UpdateStaffRequest,
};
pub use service::StaffService;
pub use session::LoginResult;
