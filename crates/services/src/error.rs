//! Shared error types for the services crate.

use thiserror::Error;

use dojo_core::model::{PlaylistError, SettingsError, TechniqueName};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `LibraryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LibraryError {
    #[error("unknown technique: {0}")]
    UnknownTechnique(TechniqueName),
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the practice history service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("practice session not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `SettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failure reported by a speech engine for one utterance.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NarrationError {
    #[error("speech engine failed: {0}")]
    Engine(String),
    #[error("speech command exited with {0}")]
    ExitStatus(std::process::ExitStatus),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The player task is gone; commands can no longer be delivered.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("practice player has stopped")]
pub struct PlayerClosed;

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
