//! # looped-entity
//!
//! Domain entity models for Looped CMS. Every struct in this crate
//! represents a stored document or a domain value object. Enums that are
//! persisted derive `sqlx::Type` and map onto Postgres enum types.

pub mod settings;
pub mod staff;
