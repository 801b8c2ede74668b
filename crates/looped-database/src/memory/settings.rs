//! In-memory site settings slot.

use async_trait::async_trait;
use tokio::sync::RwLock;

use looped_core::result::AppResult;
use looped_entity::settings::SiteSettings;

use crate::repositories::SettingsRepository;

/// Settings repository holding the single record in a lock-guarded slot.
#[derive(Debug, Default)]
pub struct MemorySettingsRepository {
    slot: RwLock<Option<SiteSettings>>,
}

impl MemorySettingsRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepository for MemorySettingsRepository {
    async fn get(&self) -> AppResult<Option<SiteSettings>> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, settings: SiteSettings) -> AppResult<SiteSettings> {
        *self.slot.write().await = Some(settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn settings(title: &str) -> SiteSettings {
        SiteSettings {
            title: title.to_string(),
            description: None,
            base_url: "https://blog.example.com".to_string(),
            timezone: "Europe/Berlin".to_string(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_empty_until_saved() {
        let repo = MemorySettingsRepository::new();
        assert!(!repo.exists().await.unwrap());
        assert!(repo.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_single_record() {
        let repo = MemorySettingsRepository::new();
        repo.save(settings("First")).await.unwrap();
        repo.save(settings("Second")).await.unwrap();

        assert!(repo.exists().await.unwrap());
        assert_eq!(repo.get().await.unwrap().unwrap().title, "Second");
    }
}
