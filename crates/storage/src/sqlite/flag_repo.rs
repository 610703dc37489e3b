use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dojo_core::model::{FlagEvent, FlagEventKind, FlagSet};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, playlist_name, ser, technique_name};
use crate::repository::{FlagRepository, StorageError};

fn map_event_row(row: &sqlx::sqlite::SqliteRow) -> Result<FlagEvent, StorageError> {
    let kind_raw: String = row.try_get("kind").map_err(ser)?;
    let kind = FlagEventKind::parse(&kind_raw)
        .ok_or_else(|| StorageError::Serialization(format!("invalid flag event kind: {kind_raw}")))?;
    let technique = technique_name(row.try_get("technique").map_err(ser)?)?;
    let playlist = row
        .try_get::<Option<String>, _>("playlist")
        .map_err(ser)?
        .map(playlist_name)
        .transpose()?;
    let timestamp: DateTime<Utc> = row.try_get("occurred_at").map_err(ser)?;

    Ok(FlagEvent {
        kind,
        technique,
        playlist,
        timestamp,
    })
}

#[async_trait]
impl FlagRepository for SqliteRepository {
    async fn get_flags(&self) -> Result<FlagSet, StorageError> {
        let rows = sqlx::query("SELECT technique FROM flags ORDER BY position ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            names.push(technique_name(row.try_get("technique").map_err(ser)?)?);
        }
        Ok(FlagSet::from_names(names))
    }

    async fn save_flags(&self, flags: &FlagSet) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        sqlx::query("DELETE FROM flags")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        for name in flags.iter() {
            sqlx::query("INSERT INTO flags (technique) VALUES (?1)")
                .bind(name.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn append_flag_event(&self, event: &FlagEvent) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO flag_events (kind, technique, playlist, occurred_at)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(event.kind.as_str())
        .bind(event.technique.as_str())
        .bind(event.playlist.as_ref().map(|p| p.as_str()))
        .bind(event.timestamp)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn list_flag_events(&self) -> Result<Vec<FlagEvent>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT kind, technique, playlist, occurred_at
                FROM flag_events
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_event_row).collect()
    }
}
