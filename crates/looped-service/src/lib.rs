//! # looped-service
//!
//! Business logic for the staff side of Looped CMS. The [`StaffService`]
//! drives the account lifecycle (registration, invitations, login,
//! password recovery) over the repository, session registry, and
//! notification gateway traits it is constructed with.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod staff;

pub use staff::{
    AcceptInviteRequest, ChangePasswordRequest, InviteRequest, LoginRequest, LoginResult,
    RegisterRequest, ResetPasswordRequest, StaffPolicy, StaffService, UpdateStaffRequest,
};
