use async_trait::async_trait;
use dojo_core::model::{Playlist, PlaylistBook};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, playlist_name, ser, technique_name, write_err};
use crate::repository::{PlaylistRepository, StorageError};

#[async_trait]
impl PlaylistRepository for SqliteRepository {
    async fn get_playlists(&self) -> Result<PlaylistBook, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT p.id AS playlist_id, p.name AS playlist, i.technique AS technique
                FROM playlists p
                LEFT JOIN playlist_items i ON i.playlist_id = p.id
                ORDER BY p.id ASC, i.position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut playlists: Vec<(i64, Playlist)> = Vec::new();
        for row in rows {
            let id: i64 = row.try_get("playlist_id").map_err(ser)?;
            if playlists.last().is_none_or(|(last, _)| *last != id) {
                let name = playlist_name(row.try_get("playlist").map_err(ser)?)?;
                playlists.push((id, Playlist::new(name)));
            }
            let member: Option<String> = row.try_get("technique").map_err(ser)?;
            if let (Some(raw), Some((_, playlist))) = (member, playlists.last_mut()) {
                playlist.add(technique_name(raw)?);
            }
        }

        Ok(PlaylistBook::from_persisted(
            playlists.into_iter().map(|(_, p)| p).collect(),
        ))
    }

    async fn save_playlists(&self, playlists: &PlaylistBook) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM playlists")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for playlist in playlists.iter() {
            let res = sqlx::query("INSERT INTO playlists (name) VALUES (?1)")
                .bind(playlist.name().as_str())
                .execute(&mut *tx)
                .await
                .map_err(write_err)?;
            let playlist_id = res.last_insert_rowid();

            for (position, technique) in playlist.techniques().iter().enumerate() {
                let position = i64::try_from(position)
                    .map_err(|_| StorageError::Serialization("playlist too large".into()))?;
                sqlx::query(
                    r"
                        INSERT INTO playlist_items (playlist_id, position, technique)
                        VALUES (?1, ?2, ?3)
                    ",
                )
                .bind(playlist_id)
                .bind(position)
                .bind(technique.as_str())
                .execute(&mut *tx)
                .await
                .map_err(write_err)?;
            }
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
