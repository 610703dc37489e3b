use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{PlaylistName, TechniqueName};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlaylistError {
    #[error("playlist {0} already exists")]
    AlreadyExists(PlaylistName),

    #[error("playlist {0} not found")]
    NotFound(PlaylistName),
}

/// A named, ordered collection of techniques. Members are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    name: PlaylistName,
    #[serde(rename = "ids")]
    techniques: Vec<TechniqueName>,
}

impl Playlist {
    #[must_use]
    pub fn new(name: PlaylistName) -> Self {
        Self {
            name,
            techniques: Vec::new(),
        }
    }

    /// Rehydrate a playlist, dropping duplicate members.
    #[must_use]
    pub fn from_persisted(name: PlaylistName, techniques: Vec<TechniqueName>) -> Self {
        let mut playlist = Self::new(name);
        for technique in techniques {
            playlist.add(technique);
        }
        playlist
    }

    #[must_use]
    pub fn name(&self) -> &PlaylistName {
        &self.name
    }

    #[must_use]
    pub fn techniques(&self) -> &[TechniqueName] {
        &self.techniques
    }

    #[must_use]
    pub fn contains(&self, technique: &TechniqueName) -> bool {
        self.techniques.contains(technique)
    }

    pub(crate) fn rename(&mut self, name: PlaylistName) {
        self.name = name;
    }

    /// Returns `true` if the technique was added.
    pub fn add(&mut self, technique: TechniqueName) -> bool {
        if self.contains(&technique) {
            return false;
        }
        self.techniques.push(technique);
        true
    }

    /// Returns `true` if the technique was a member.
    pub fn remove(&mut self, technique: &TechniqueName) -> bool {
        let before = self.techniques.len();
        self.techniques.retain(|t| t != technique);
        before != self.techniques.len()
    }
}

/// The user's playlists, with name uniqueness enforced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistBook(Vec<Playlist>);

impl PlaylistBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_persisted(playlists: Vec<Playlist>) -> Self {
        let mut book = Self::new();
        for playlist in playlists {
            if book.get(playlist.name()).is_none() {
                book.0.push(playlist);
            }
        }
        book
    }

    #[must_use]
    pub fn get(&self, name: &PlaylistName) -> Option<&Playlist> {
        self.0.iter().find(|p| p.name() == name)
    }

    fn get_mut(&mut self, name: &PlaylistName) -> Result<&mut Playlist, PlaylistError> {
        self.0
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| PlaylistError::NotFound(name.clone()))
    }

    /// Create an empty playlist.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::AlreadyExists` if the name is taken.
    pub fn create(&mut self, name: PlaylistName) -> Result<&Playlist, PlaylistError> {
        if self.get(&name).is_some() {
            return Err(PlaylistError::AlreadyExists(name));
        }
        self.0.push(Playlist::new(name));
        let idx = self.0.len() - 1;
        Ok(&self.0[idx])
    }

    /// Rename a playlist. Renaming to the same name is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `PlaylistError::NotFound` for an unknown source or
    /// `PlaylistError::AlreadyExists` when the new name is taken.
    pub fn rename(&mut self, from: &PlaylistName, to: PlaylistName) -> Result<(), PlaylistError> {
        if from == &to {
            return self.get_mut(from).map(|_| ());
        }
        if self.get(&to).is_some() {
            return Err(PlaylistError::AlreadyExists(to));
        }
        self.get_mut(from)?.rename(to);
        Ok(())
    }

    /// Remove a playlist; returns `true` if it existed.
    pub fn delete(&mut self, name: &PlaylistName) -> bool {
        let before = self.0.len();
        self.0.retain(|p| p.name() != name);
        before != self.0.len()
    }

    /// # Errors
    ///
    /// Returns `PlaylistError::NotFound` if the playlist does not exist.
    pub fn add(
        &mut self,
        name: &PlaylistName,
        technique: TechniqueName,
    ) -> Result<bool, PlaylistError> {
        Ok(self.get_mut(name)?.add(technique))
    }

    /// # Errors
    ///
    /// Returns `PlaylistError::NotFound` if the playlist does not exist.
    pub fn remove(
        &mut self,
        name: &PlaylistName,
        technique: &TechniqueName,
    ) -> Result<bool, PlaylistError> {
        Ok(self.get_mut(name)?.remove(technique))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Playlist> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pl(raw: &str) -> PlaylistName {
        PlaylistName::new(raw).unwrap()
    }

    fn tn(raw: &str) -> TechniqueName {
        TechniqueName::new(raw).unwrap()
    }

    #[test]
    fn create_rejects_duplicate_names() {
        let mut book = PlaylistBook::new();
        book.create(pl("Warmup")).unwrap();
        let err = book.create(pl("Warmup")).unwrap_err();
        assert_eq!(err, PlaylistError::AlreadyExists(pl("Warmup")));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn add_deduplicates_members() {
        let mut book = PlaylistBook::new();
        book.create(pl("Warmup")).unwrap();
        assert!(book.add(&pl("Warmup"), tn("A")).unwrap());
        assert!(!book.add(&pl("Warmup"), tn("A")).unwrap());
        assert_eq!(book.get(&pl("Warmup")).unwrap().techniques(), &[tn("A")]);
    }

    #[test]
    fn rename_refuses_collision_and_allows_same_name() {
        let mut book = PlaylistBook::new();
        book.create(pl("One")).unwrap();
        book.create(pl("Two")).unwrap();
        assert!(matches!(
            book.rename(&pl("One"), pl("Two")),
            Err(PlaylistError::AlreadyExists(_))
        ));
        book.rename(&pl("One"), pl("One")).unwrap();
        book.rename(&pl("One"), pl("Three")).unwrap();
        assert!(book.get(&pl("Three")).is_some());
        assert!(book.get(&pl("One")).is_none());
    }

    #[test]
    fn unknown_playlist_reports_not_found() {
        let mut book = PlaylistBook::new();
        assert!(matches!(
            book.remove(&pl("Ghost"), &tn("A")),
            Err(PlaylistError::NotFound(_))
        ));
        assert!(!book.delete(&pl("Ghost")));
    }
}
