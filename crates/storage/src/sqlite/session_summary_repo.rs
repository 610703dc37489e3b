use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dojo_core::model::SessionSummary;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, names_from_json, names_to_json, ser, u64_to_i64};
use crate::repository::{SessionSummaryRepository, SessionSummaryRow, StorageError};

fn map_summary_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionSummaryRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let completed_at: DateTime<Utc> = row.try_get("completed_at").map_err(ser)?;
    let duration_raw: i64 = row.try_get("duration_ms").map_err(ser)?;
    let duration_ms = u64::try_from(duration_raw)
        .map_err(|_| StorageError::Serialization(format!("invalid duration_ms: {duration_raw}")))?;
    let techniques = names_from_json(&row.try_get::<String, _>("techniques").map_err(ser)?)?;
    let flagged = names_from_json(&row.try_get::<String, _>("flagged").map_err(ser)?)?;

    let summary = SessionSummary::from_persisted(completed_at, techniques, duration_ms, flagged)
        .map_err(ser)?;
    Ok(SessionSummaryRow::new(id, summary))
}

#[async_trait]
impl SessionSummaryRepository for SqliteRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO session_summaries (completed_at, duration_ms, techniques, flagged)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(summary.timestamp())
        .bind(u64_to_i64("duration_ms", summary.duration_ms())?)
        .bind(names_to_json(summary.techniques())?)
        .bind(names_to_json(summary.flagged())?)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn list_summary_rows(&self) -> Result<Vec<SessionSummaryRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, completed_at, duration_ms, techniques, flagged
                FROM session_summaries
                ORDER BY completed_at ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_summary_row).collect()
    }

    async fn find_summary(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<SessionSummaryRow>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, completed_at, duration_ms, techniques, flagged
                FROM session_summaries
                WHERE completed_at = ?1
                ORDER BY id ASC
                LIMIT 1
            ",
        )
        .bind(timestamp)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_summary_row).transpose()
    }

    async fn clear_summaries(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_summaries")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
