use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dojo_core::model::{
    Audience, FlagEvent, FlagEventKind, FlagSet, PlaylistBook, PlaylistName, Technique,
    TechniqueName, TechniqueView,
};
use rand::Rng;
use rand::seq::SliceRandom;
use storage::repository::{
    FlagRepository, PlaylistRepository, Storage, TechniqueRepository, TechniqueViewRepository,
};

use crate::Clock;
use crate::error::LibraryError;
use crate::sessions::FlagLookup;

/// A belt and who the random list is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeltSelection {
    pub belt: String,
    pub audience: Audience,
}

impl BeltSelection {
    #[must_use]
    pub fn new(belt: impl Into<String>, audience: Audience) -> Self {
        Self {
            belt: belt.into(),
            audience,
        }
    }
}

/// One belt of the curriculum, as offered for random practice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeltInfo {
    pub name: String,
    pub belt_number: u32,
    pub has_kids: bool,
}

#[derive(Default)]
struct LibraryState {
    catalog: Vec<Technique>,
    flags: FlagSet,
    playlists: PlaylistBook,
    current: Vec<Technique>,
}

/// The user's technique library: catalog, flags, playlists and the list
/// currently selected for practice.
///
/// State is cached in memory after [`LibraryService::load`] and written
/// through to storage on every change.
pub struct LibraryService {
    clock: Clock,
    techniques: Arc<dyn TechniqueRepository>,
    flags: Arc<dyn FlagRepository>,
    playlists: Arc<dyn PlaylistRepository>,
    views: Arc<dyn TechniqueViewRepository>,
    state: RwLock<LibraryState>,
}

impl LibraryService {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        Self {
            clock,
            techniques: Arc::clone(&storage.techniques),
            flags: Arc::clone(&storage.flags),
            playlists: Arc::clone(&storage.playlists),
            views: Arc::clone(&storage.views),
            state: RwLock::new(LibraryState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LibraryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LibraryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refresh the cache from storage.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` on repository failures.
    pub async fn load(&self) -> Result<(), LibraryError> {
        let catalog = self.techniques.list_techniques().await?;
        let flags = self.flags.get_flags().await?;
        let playlists = self.playlists.get_playlists().await?;

        let mut state = self.write();
        state.catalog = catalog;
        state.flags = flags;
        state.playlists = playlists;
        Ok(())
    }

    #[must_use]
    pub fn techniques(&self) -> Vec<Technique> {
        self.read().catalog.clone()
    }

    #[must_use]
    pub fn technique(&self, name: &TechniqueName) -> Option<Technique> {
        self.read().catalog.iter().find(|t| t.name() == name).cloned()
    }

    fn require_known(&self, name: &TechniqueName) -> Result<(), LibraryError> {
        if self.read().catalog.iter().any(|t| t.name() == name) {
            Ok(())
        } else {
            Err(LibraryError::UnknownTechnique(name.clone()))
        }
    }

    //
    // ─── FLAGS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn flags(&self) -> FlagSet {
        self.read().flags.clone()
    }

    /// Flag or unflag a technique and log the change.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::UnknownTechnique` for names outside the catalog,
    /// or `LibraryError::Storage` if persistence fails.
    pub async fn toggle_flag(&self, name: &TechniqueName) -> Result<FlagEventKind, LibraryError> {
        self.require_known(name)?;
        let mut next = self.flags();
        let kind = next.toggle(name.clone());

        self.flags.save_flags(&next).await?;
        self.flags
            .append_flag_event(&FlagEvent::flag(kind, name.clone(), self.clock.now()))
            .await?;
        self.write().flags = next;
        Ok(kind)
    }

    /// Flagged techniques in catalog order.
    #[must_use]
    pub fn flagged_techniques(&self) -> Vec<Technique> {
        let state = self.read();
        state
            .catalog
            .iter()
            .filter(|t| state.flags.contains(t.name()))
            .cloned()
            .collect()
    }

    //
    // ─── PLAYLISTS ─────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn playlists(&self) -> PlaylistBook {
        self.read().playlists.clone()
    }

    async fn save_playlists(&self, next: PlaylistBook) -> Result<(), LibraryError> {
        self.playlists.save_playlists(&next).await?;
        self.write().playlists = next;
        Ok(())
    }

    /// Create an empty playlist. Returns `false` if the name is already taken.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn create_playlist(&self, name: PlaylistName) -> Result<bool, LibraryError> {
        let mut next = self.playlists();
        if next.create(name).is_err() {
            return Ok(false);
        }
        self.save_playlists(next).await?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns `LibraryError::Playlist` when `from` is missing or `to` is
    /// taken, or `LibraryError::Storage` if persistence fails.
    pub async fn rename_playlist(
        &self,
        from: &PlaylistName,
        to: PlaylistName,
    ) -> Result<(), LibraryError> {
        if from == &to {
            return Ok(());
        }
        let mut next = self.playlists();
        next.rename(from, to)?;
        self.save_playlists(next).await
    }

    /// Returns `false` if no such playlist existed.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn delete_playlist(&self, name: &PlaylistName) -> Result<bool, LibraryError> {
        let mut next = self.playlists();
        if !next.delete(name) {
            return Ok(false);
        }
        self.save_playlists(next).await?;
        Ok(true)
    }

    /// Add a technique; adding a member twice is a no-op returning `false`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` for unknown playlists or techniques and storage failures.
    pub async fn add_to_playlist(
        &self,
        playlist: &PlaylistName,
        name: &TechniqueName,
    ) -> Result<bool, LibraryError> {
        self.require_known(name)?;
        let mut next = self.playlists();
        if !next.add(playlist, name.clone())? {
            return Ok(false);
        }
        self.save_playlists(next).await?;
        self.log_playlist_event(FlagEventKind::PlaylistAdd, playlist, name)
            .await?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns `LibraryError` for unknown playlists and storage failures.
    pub async fn remove_from_playlist(
        &self,
        playlist: &PlaylistName,
        name: &TechniqueName,
    ) -> Result<bool, LibraryError> {
        let mut next = self.playlists();
        if !next.remove(playlist, name)? {
            return Ok(false);
        }
        self.save_playlists(next).await?;
        self.log_playlist_event(FlagEventKind::PlaylistRemove, playlist, name)
            .await?;
        Ok(true)
    }

    /// Add when absent, remove when present.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` for unknown playlists or techniques and storage failures.
    pub async fn toggle_in_playlist(
        &self,
        playlist: &PlaylistName,
        name: &TechniqueName,
    ) -> Result<FlagEventKind, LibraryError> {
        let is_member = self
            .read()
            .playlists
            .get(playlist)
            .map(|p| p.contains(name))
            .ok_or_else(|| dojo_core::model::PlaylistError::NotFound(playlist.clone()))?;
        if is_member {
            self.remove_from_playlist(playlist, name).await?;
            Ok(FlagEventKind::PlaylistRemove)
        } else {
            self.add_to_playlist(playlist, name).await?;
            Ok(FlagEventKind::PlaylistAdd)
        }
    }

    async fn log_playlist_event(
        &self,
        kind: FlagEventKind,
        playlist: &PlaylistName,
        name: &TechniqueName,
    ) -> Result<(), LibraryError> {
        let event = FlagEvent::playlist(kind, name.clone(), playlist.clone(), self.clock.now());
        self.flags.append_flag_event(&event).await?;
        Ok(())
    }

    /// Members of a playlist in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Playlist` if the playlist does not exist.
    pub fn playlist_techniques(&self, name: &PlaylistName) -> Result<Vec<Technique>, LibraryError> {
        let state = self.read();
        let playlist = state
            .playlists
            .get(name)
            .ok_or_else(|| dojo_core::model::PlaylistError::NotFound(name.clone()))?;
        Ok(state
            .catalog
            .iter()
            .filter(|t| playlist.contains(t.name()))
            .cloned()
            .collect())
    }

    //
    // ─── PRACTICE LISTS ────────────────────────────────────────────────────────
    //

    /// Belts in curriculum order. `has_kids` marks belts with kids techniques.
    #[must_use]
    pub fn belts(&self) -> Vec<BeltInfo> {
        let mut belts: Vec<BeltInfo> = Vec::new();
        for technique in &self.read().catalog {
            match belts.iter_mut().find(|b| b.name == technique.belt()) {
                Some(belt) => belt.has_kids |= technique.kids(),
                None => belts.push(BeltInfo {
                    name: technique.belt().to_owned(),
                    belt_number: technique.belt_number(),
                    has_kids: technique.kids(),
                }),
            }
        }
        belts.sort_by_key(|b| b.belt_number);
        belts
    }

    /// Shuffled practice list of every technique matching any selection.
    #[must_use]
    pub fn random_list<R: Rng + ?Sized>(
        &self,
        selections: &[BeltSelection],
        rng: &mut R,
    ) -> Vec<Technique> {
        let mut list: Vec<Technique> = self
            .read()
            .catalog
            .iter()
            .filter(|t| {
                selections
                    .iter()
                    .any(|s| s.belt == t.belt() && t.suits(s.audience))
            })
            .cloned()
            .collect();
        list.shuffle(rng);
        list
    }

    #[must_use]
    pub fn current_list(&self) -> Vec<Technique> {
        self.read().current.clone()
    }

    pub fn set_current_list(&self, list: Vec<Technique>) {
        self.write().current = list;
    }

    /// Log that a technique's detail was opened.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::Storage` if persistence fails.
    pub async fn record_view(&self, name: &TechniqueName) -> Result<(), LibraryError> {
        self.require_known(name)?;
        self.views
            .append_view(&TechniqueView::new(name.clone(), self.clock.now()))
            .await?;
        Ok(())
    }
}

impl FlagLookup for LibraryService {
    fn is_flagged(&self, name: &TechniqueName) -> bool {
        self.read().flags.contains(name)
    }
}
