//! Site settings entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Global site settings.
///
/// Stored as a single row: at most one record exists and every save
/// overwrites it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SiteSettings {
    /// Public site title.
    pub title: String,
    /// Short description shown in feeds and meta tags.
    pub description: Option<String>,
    /// Canonical public URL.
    pub base_url: String,
    /// IANA timezone name used for scheduling.
    pub timezone: String,
    /// When the settings were last saved.
    pub updated_at: DateTime<Utc>,
}
