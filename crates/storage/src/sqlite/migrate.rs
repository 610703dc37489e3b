use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS techniques (
            position INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            number INTEGER NOT NULL CHECK (number >= 0),
            belt TEXT NOT NULL,
            belt_number INTEGER NOT NULL CHECK (belt_number >= 0),
            attack TEXT NOT NULL,
            block TEXT NOT NULL,
            strike TEXT NOT NULL,
            complete INTEGER NOT NULL CHECK (complete IN (0, 1)),
            link TEXT NOT NULL,
            kids INTEGER NOT NULL CHECK (kids IN (0, 1)),
            adults TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS flags (
            position INTEGER PRIMARY KEY,
            technique TEXT NOT NULL UNIQUE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS flag_events (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL
                CHECK (kind IN ('flag', 'unflag', 'playlist-add', 'playlist-remove')),
            technique TEXT NOT NULL,
            playlist TEXT,
            occurred_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS playlists (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS playlist_items (
            playlist_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            technique TEXT NOT NULL,
            PRIMARY KEY (playlist_id, position),
            UNIQUE (playlist_id, technique),
            FOREIGN KEY (playlist_id) REFERENCES playlists(id) ON DELETE CASCADE
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS session_summaries (
            id INTEGER PRIMARY KEY,
            completed_at TEXT NOT NULL,
            duration_ms INTEGER NOT NULL CHECK (duration_ms >= 0),
            techniques TEXT NOT NULL,
            flagged TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS technique_views (
            id INTEGER PRIMARY KEY,
            technique TEXT NOT NULL,
            viewed_at TEXT NOT NULL
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS practice_settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            delay_ms INTEGER NOT NULL CHECK (delay_ms > 0),
            reminder_hour INTEGER CHECK (reminder_hour BETWEEN 0 AND 23),
            reminder_minute INTEGER CHECK (reminder_minute BETWEEN 0 AND 59)
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_session_summaries_completed
            ON session_summaries (completed_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_technique_views_technique
            ON technique_views (technique);
    ",
];

/// Applies versioned schema migrations.
///
/// Version 1 creates the catalog, flags, playlists, history, views and settings tables.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        for statement in SCHEMA_V1 {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
