use async_trait::async_trait;
use sqlx::Row;

use dojo_core::model::{PracticeSettings, PracticeSettingsDraft};

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{SettingsRepository, StorageError};

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<PracticeSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT delay_ms, reminder_hour, reminder_minute
            FROM practice_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let delay_ms: i64 = row.try_get("delay_ms").map_err(ser)?;
        let reminder_hour: Option<i64> = row.try_get("reminder_hour").map_err(ser)?;
        let reminder_minute: Option<i64> = row.try_get("reminder_minute").map_err(ser)?;

        PracticeSettingsDraft {
            delay_ms: Some(u32::try_from(delay_ms).map_err(ser)?),
            reminder_hour: reminder_hour.map(u8::try_from).transpose().map_err(ser)?,
            reminder_minute: reminder_minute.map(u8::try_from).transpose().map_err(ser)?,
        }
        .validate()
        .map(Some)
        .map_err(ser)
    }

    async fn save_settings(&self, settings: &PracticeSettings) -> Result<(), StorageError> {
        let reminder = settings.reminder();
        sqlx::query(
            r"
            INSERT INTO practice_settings (id, delay_ms, reminder_hour, reminder_minute)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                delay_ms = excluded.delay_ms,
                reminder_hour = excluded.reminder_hour,
                reminder_minute = excluded.reminder_minute
            ",
        )
        .bind(1_i64)
        .bind(i64::from(settings.delay_ms()))
        .bind(reminder.map(|r| i64::from(r.hour())))
        .bind(reminder.map(|r| i64::from(r.minute())))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
