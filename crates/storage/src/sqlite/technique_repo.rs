use async_trait::async_trait;
use dojo_core::model::Technique;

use super::SqliteRepository;
use super::mapping::{conn, map_technique_row, write_err};
use crate::repository::{StorageError, TechniqueRepository};

#[async_trait]
impl TechniqueRepository for SqliteRepository {
    async fn replace_catalog(&self, techniques: &[Technique]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM techniques")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, technique) in techniques.iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("catalog too large".into()))?;
            sqlx::query(
                r"
                    INSERT INTO techniques (
                        position, name, number, belt, belt_number,
                        attack, block, strike, complete, link, kids, adults
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ",
            )
            .bind(position)
            .bind(technique.name().as_str())
            .bind(i64::from(technique.number()))
            .bind(technique.belt())
            .bind(i64::from(technique.belt_number()))
            .bind(technique.attack())
            .bind(technique.block())
            .bind(technique.strike())
            .bind(technique.complete())
            .bind(technique.link())
            .bind(technique.kids())
            .bind(technique.adults())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn list_techniques(&self) -> Result<Vec<Technique>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    name, number, belt, belt_number,
                    attack, block, strike, complete, link, kids, adults
                FROM techniques
                ORDER BY position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_technique_row).collect()
    }
}
