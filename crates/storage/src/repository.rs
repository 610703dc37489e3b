use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dojo_core::model::{
    FlagEvent, FlagSet, PlaylistBook, PracticeSettings, SessionSummary, Technique, TechniqueView,
};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted session summary together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummaryRow {
    pub id: i64,
    pub summary: SessionSummary,
}

impl SessionSummaryRow {
    #[must_use]
    pub fn new(id: i64, summary: SessionSummary) -> Self {
        Self { id, summary }
    }
}

/// Technique catalog, stored in catalog order.
#[async_trait]
pub trait TechniqueRepository: Send + Sync {
    /// Replace the whole catalog with `techniques`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` on duplicate names, or other storage errors.
    async fn replace_catalog(&self, techniques: &[Technique]) -> Result<(), StorageError>;

    /// List the catalog in stored order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if rows cannot be read or decoded.
    async fn list_techniques(&self) -> Result<Vec<Technique>, StorageError>;
}

#[async_trait]
pub trait FlagRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the flag set cannot be read.
    async fn get_flags(&self) -> Result<FlagSet, StorageError>;

    /// Persist the full flag set, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the flag set cannot be stored.
    async fn save_flags(&self, flags: &FlagSet) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the event cannot be stored.
    async fn append_flag_event(&self, event: &FlagEvent) -> Result<(), StorageError>;

    /// Events in the order they were appended.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if events cannot be read or decoded.
    async fn list_flag_events(&self) -> Result<Vec<FlagEvent>, StorageError>;
}

#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if playlists cannot be read or decoded.
    async fn get_playlists(&self) -> Result<PlaylistBook, StorageError>;

    /// Persist every playlist, replacing the previous set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the playlists cannot be stored.
    async fn save_playlists(&self, playlists: &PlaylistBook) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SessionSummaryRepository: Send + Sync {
    /// Append a completed session and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the summary cannot be stored.
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError>;

    /// All summaries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if rows cannot be read or decoded.
    async fn list_summary_rows(&self) -> Result<Vec<SessionSummaryRow>, StorageError>;

    /// Find a summary by its completion timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn find_summary(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<SessionSummaryRow>, StorageError>;

    /// Delete all practice history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on write failures.
    async fn clear_summaries(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait TechniqueViewRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the view cannot be stored.
    async fn append_view(&self, view: &TechniqueView) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if views cannot be read or decoded.
    async fn list_views(&self) -> Result<Vec<TechniqueView>, StorageError>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Stored settings, or `None` if the user never saved any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be read or fails validation.
    async fn get_settings(&self) -> Result<Option<PracticeSettings>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(&self, settings: &PracticeSettings) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    techniques: Vec<Technique>,
    flags: FlagSet,
    flag_events: Vec<FlagEvent>,
    playlists: PlaylistBook,
    summaries: Vec<SessionSummaryRow>,
    next_summary_id: i64,
    views: Vec<TechniqueView>,
    settings: Option<PracticeSettings>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> Result<T, StorageError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl TechniqueRepository for InMemoryRepository {
    async fn replace_catalog(&self, techniques: &[Technique]) -> Result<(), StorageError> {
        for (i, t) in techniques.iter().enumerate() {
            if techniques[..i].iter().any(|prev| prev.name() == t.name()) {
                return Err(StorageError::Conflict);
            }
        }
        self.with_state(|s| s.techniques = techniques.to_vec())
    }

    async fn list_techniques(&self) -> Result<Vec<Technique>, StorageError> {
        self.with_state(|s| s.techniques.clone())
    }
}

#[async_trait]
impl FlagRepository for InMemoryRepository {
    async fn get_flags(&self) -> Result<FlagSet, StorageError> {
        self.with_state(|s| s.flags.clone())
    }

    async fn save_flags(&self, flags: &FlagSet) -> Result<(), StorageError> {
        self.with_state(|s| s.flags = flags.clone())
    }

    async fn append_flag_event(&self, event: &FlagEvent) -> Result<(), StorageError> {
        self.with_state(|s| s.flag_events.push(event.clone()))
    }

    async fn list_flag_events(&self) -> Result<Vec<FlagEvent>, StorageError> {
        self.with_state(|s| s.flag_events.clone())
    }
}

#[async_trait]
impl PlaylistRepository for InMemoryRepository {
    async fn get_playlists(&self) -> Result<PlaylistBook, StorageError> {
        self.with_state(|s| s.playlists.clone())
    }

    async fn save_playlists(&self, playlists: &PlaylistBook) -> Result<(), StorageError> {
        self.with_state(|s| s.playlists = playlists.clone())
    }
}

#[async_trait]
impl SessionSummaryRepository for InMemoryRepository {
    async fn append_summary(&self, summary: &SessionSummary) -> Result<i64, StorageError> {
        self.with_state(|s| {
            s.next_summary_id += 1;
            let id = s.next_summary_id;
            s.summaries.push(SessionSummaryRow::new(id, summary.clone()));
            id
        })
    }

    async fn list_summary_rows(&self) -> Result<Vec<SessionSummaryRow>, StorageError> {
        self.with_state(|s| {
            let mut rows = s.summaries.clone();
            rows.sort_by_key(|r| (r.summary.timestamp(), r.id));
            rows
        })
    }

    async fn find_summary(
        &self,
        timestamp: DateTime<Utc>,
    ) -> Result<Option<SessionSummaryRow>, StorageError> {
        self.with_state(|s| {
            s.summaries
                .iter()
                .find(|r| r.summary.timestamp() == timestamp)
                .cloned()
        })
    }

    async fn clear_summaries(&self) -> Result<(), StorageError> {
        self.with_state(|s| s.summaries.clear())
    }
}

#[async_trait]
impl TechniqueViewRepository for InMemoryRepository {
    async fn append_view(&self, view: &TechniqueView) -> Result<(), StorageError> {
        self.with_state(|s| s.views.push(view.clone()))
    }

    async fn list_views(&self) -> Result<Vec<TechniqueView>, StorageError> {
        self.with_state(|s| s.views.clone())
    }
}

#[async_trait]
impl SettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<PracticeSettings>, StorageError> {
        self.with_state(|s| s.settings.clone())
    }

    async fn save_settings(&self, settings: &PracticeSettings) -> Result<(), StorageError> {
        self.with_state(|s| s.settings = Some(settings.clone()))
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub techniques: Arc<dyn TechniqueRepository>,
    pub flags: Arc<dyn FlagRepository>,
    pub playlists: Arc<dyn PlaylistRepository>,
    pub session_summaries: Arc<dyn SessionSummaryRepository>,
    pub views: Arc<dyn TechniqueViewRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            techniques: Arc::new(repo.clone()),
            flags: Arc::new(repo.clone()),
            playlists: Arc::new(repo.clone()),
            session_summaries: Arc::new(repo.clone()),
            views: Arc::new(repo.clone()),
            settings: Arc::new(repo),
        }
    }
}
