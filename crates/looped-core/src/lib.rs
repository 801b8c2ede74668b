//! # looped-core
//!
//! Core crate for Looped CMS. Contains configuration schemas, typed
//! identifiers, pagination types, the clock seam, and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Looped crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
