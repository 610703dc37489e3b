#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod library_service;
pub mod sessions;
pub mod settings_service;
pub mod stats_service;

pub use dojo_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, SearchFilters};
pub use error::{
    AppServicesError, CatalogError, HistoryError, LibraryError, NarrationError, PlayerClosed,
    SettingsServiceError, StatsError,
};
pub use library_service::{BeltInfo, BeltSelection, LibraryService};
pub use settings_service::SettingsService;
pub use stats_service::StatsService;

pub use sessions::{
    HistoryService, MemoryRecorder, PlayerCommand, PlayerConfig, PlayerHandle, PlayerSnapshot,
    PlayerState, SessionPlayer, SessionRecorder, SpeechEngine, StorageRecorder, spawn_player,
};
