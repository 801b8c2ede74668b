//! Site-wide settings singleton.

pub mod model;

pub use model::SiteSettings;
