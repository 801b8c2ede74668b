//! Site settings repository.

use async_trait::async_trait;
use sqlx::PgPool;

use looped_core::result::AppResult;
use looped_entity::settings::SiteSettings;

use crate::error::map_sqlx_error;

/// Storage for the single site settings record.
#[async_trait]
pub trait SettingsRepository: Send + Sync + 'static {
    /// Load the settings, if they have ever been saved.
    async fn get(&self) -> AppResult<Option<SiteSettings>>;

    /// Whether a settings record exists.
    async fn exists(&self) -> AppResult<bool> {
        Ok(self.get().await?.is_some())
    }

    /// Create or overwrite the settings record.
    async fn save(&self, settings: SiteSettings) -> AppResult<SiteSettings>;
}

/// PostgreSQL-backed settings repository.
///
/// The table holds at most one row, pinned to `id = 1` by a check
/// constraint.
#[derive(Debug, Clone)]
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    /// Create a new settings repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get(&self) -> AppResult<Option<SiteSettings>> {
        sqlx::query_as::<_, SiteSettings>(
            "SELECT title, description, base_url, timezone, updated_at \
             FROM site_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to load site settings"))
    }

    async fn save(&self, settings: SiteSettings) -> AppResult<SiteSettings> {
        sqlx::query_as::<_, SiteSettings>(
            "INSERT INTO site_settings (id, title, description, base_url, timezone, updated_at) \
             VALUES (1, $1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET \
                title = EXCLUDED.title, \
                description = EXCLUDED.description, \
                base_url = EXCLUDED.base_url, \
                timezone = EXCLUDED.timezone, \
                updated_at = EXCLUDED.updated_at \
             RETURNING title, description, base_url, timezone, updated_at",
        )
        .bind(&settings.title)
        .bind(&settings.description)
        .bind(&settings.base_url)
        .bind(&settings.timezone)
        .bind(settings.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to save site settings"))
    }
}
