//! # looped-auth
//!
//! Credential handling for staff accounts.
//!
//! ## Modules
//!
//! - `password`: Argon2id hashing and new-password policy
//! - `code`: invite codes and reset tokens: generation, digests, checks
//! - `jwt`: signed session tokens bound to a staff member and a session
//! - `session`: live session registry backing token revocation

pub mod code;
pub mod jwt;
pub mod password;
pub mod session;

pub use code::{CodeCheck, check_code, digest_code, generate_code};
pub use jwt::{Claims, IssuedToken, TokenIssuer};
pub use password::{PasswordHasher, PasswordValidator};
pub use session::{MemorySessionStore, SessionRecord, SessionStore};
