use std::sync::Arc;

use dojo_core::model::{DEFAULT_DELAY_MS, PracticeSettings, PracticeSettingsDraft};
use storage::repository::SettingsRepository;

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<PracticeSettings, SettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and persist new settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        draft: PracticeSettingsDraft,
    ) -> Result<PracticeSettings, SettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(&settings).await?;
        Ok(settings)
    }

    /// Restore the default pause between techniques, keeping the reminder.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn reset_delay(&self) -> Result<PracticeSettings, SettingsServiceError> {
        let mut draft = self.load().await?.to_draft();
        draft.delay_ms = Some(DEFAULT_DELAY_MS);
        self.save(draft).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dojo_core::model::SettingsError;
    use storage::repository::InMemoryRepository;

    fn service() -> SettingsService {
        SettingsService::new(Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn load_defaults_when_unset() {
        let settings = service().load().await.unwrap();
        assert_eq!(settings.delay_ms(), DEFAULT_DELAY_MS);
        assert_eq!(settings.reminder(), None);
    }

    #[tokio::test]
    async fn save_validates_and_reset_keeps_reminder() {
        let svc = service();
        let bad = PracticeSettingsDraft {
            delay_ms: Some(0),
            ..PracticeSettingsDraft::default()
        };
        assert!(matches!(
            svc.save(bad).await,
            Err(SettingsServiceError::Settings(SettingsError::InvalidDelay))
        ));

        let saved = svc
            .save(PracticeSettingsDraft {
                delay_ms: Some(1_500),
                reminder_hour: Some(18),
                reminder_minute: Some(0),
            })
            .await
            .unwrap();
        assert_eq!(svc.load().await.unwrap(), saved);

        let reset = svc.reset_delay().await.unwrap();
        assert_eq!(reset.delay_ms(), DEFAULT_DELAY_MS);
        assert_eq!(reset.reminder(), saved.reminder());
    }
}
