use async_trait::async_trait;
use dojo_core::model::TechniqueView;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, technique_name};
use crate::repository::{StorageError, TechniqueViewRepository};

#[async_trait]
impl TechniqueViewRepository for SqliteRepository {
    async fn append_view(&self, view: &TechniqueView) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO technique_views (technique, viewed_at) VALUES (?1, ?2)")
            .bind(view.name.as_str())
            .bind(view.timestamp)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn list_views(&self) -> Result<Vec<TechniqueView>, StorageError> {
        let rows = sqlx::query("SELECT technique, viewed_at FROM technique_views ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let name = technique_name(row.try_get("technique").map_err(ser)?)?;
            out.push(TechniqueView::new(name, row.try_get("viewed_at").map_err(ser)?));
        }
        Ok(out)
    }
}
