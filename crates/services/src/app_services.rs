use std::sync::Arc;

use storage::repository::Storage;
use tokio::runtime::Handle;

use crate::Clock;
use crate::catalog_service::CatalogService;
use crate::error::AppServicesError;
use crate::library_service::LibraryService;
use crate::sessions::{HistoryService, StorageRecorder};
use crate::settings_service::SettingsService;
use crate::stats_service::StatsService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    library: Arc<LibraryService>,
    catalog: Arc<CatalogService>,
    history: Arc<HistoryService>,
    stats: Arc<StatsService>,
    settings: Arc<SettingsService>,
    recorder: Arc<StorageRecorder>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or the initial
    /// library load fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::from_storage(&storage, clock).await
    }

    /// Build services over an existing storage and load the library cache.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the library cannot be loaded.
    pub async fn from_storage(storage: &Storage, clock: Clock) -> Result<Self, AppServicesError> {
        let library = Arc::new(LibraryService::new(clock, storage));
        library.load().await?;

        Ok(Self {
            clock,
            library,
            catalog: Arc::new(CatalogService::from_env(Arc::clone(&storage.techniques))),
            history: Arc::new(HistoryService::new(Arc::clone(&storage.session_summaries))),
            stats: Arc::new(StatsService::new(storage)),
            settings: Arc::new(SettingsService::new(Arc::clone(&storage.settings))),
            recorder: Arc::new(StorageRecorder::new(
                Arc::clone(&storage.session_summaries),
                Handle::current(),
            )),
        })
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn library(&self) -> Arc<LibraryService> {
        Arc::clone(&self.library)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsService> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<SettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn recorder(&self) -> Arc<StorageRecorder> {
        Arc::clone(&self.recorder)
    }
}
