use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{PlaylistName, TechniqueName};

//
// ─── FLAG SET ──────────────────────────────────────────────────────────────────
//

/// Techniques the user has marked for extra attention, in the order they were flagged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(Vec<TechniqueName>);

impl FlagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from persisted names, dropping duplicates.
    #[must_use]
    pub fn from_names(names: impl IntoIterator<Item = TechniqueName>) -> Self {
        let mut set = Self::new();
        for name in names {
            set.insert(name);
        }
        set
    }

    #[must_use]
    pub fn contains(&self, name: &TechniqueName) -> bool {
        self.0.contains(name)
    }

    /// Returns `true` if the name was newly flagged.
    pub fn insert(&mut self, name: TechniqueName) -> bool {
        if self.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    /// Returns `true` if the name was flagged before.
    pub fn remove(&mut self, name: &TechniqueName) -> bool {
        let before = self.0.len();
        self.0.retain(|n| n != name);
        before != self.0.len()
    }

    /// Flip the flag and report which way it went.
    pub fn toggle(&mut self, name: TechniqueName) -> FlagEventKind {
        if self.remove(&name) {
            FlagEventKind::Unflag
        } else {
            self.0.push(name);
            FlagEventKind::Flag
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TechniqueName> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[TechniqueName] {
        &self.0
    }
}

//
// ─── FLAG EVENTS ───────────────────────────────────────────────────────────────
//

/// Kind of curation event recorded for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagEventKind {
    Flag,
    Unflag,
    PlaylistAdd,
    PlaylistRemove,
}

impl FlagEventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FlagEventKind::Flag => "flag",
            FlagEventKind::Unflag => "unflag",
            FlagEventKind::PlaylistAdd => "playlist-add",
            FlagEventKind::PlaylistRemove => "playlist-remove",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "flag" => Some(FlagEventKind::Flag),
            "unflag" => Some(FlagEventKind::Unflag),
            "playlist-add" => Some(FlagEventKind::PlaylistAdd),
            "playlist-remove" => Some(FlagEventKind::PlaylistRemove),
            _ => None,
        }
    }
}

/// A single flag or playlist membership change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagEvent {
    #[serde(rename = "type")]
    pub kind: FlagEventKind,
    pub technique: TechniqueName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist: Option<PlaylistName>,
    pub timestamp: DateTime<Utc>,
}

impl FlagEvent {
    #[must_use]
    pub fn flag(kind: FlagEventKind, technique: TechniqueName, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            technique,
            playlist: None,
            timestamp: at,
        }
    }

    #[must_use]
    pub fn playlist(
        kind: FlagEventKind,
        technique: TechniqueName,
        playlist: PlaylistName,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            technique,
            playlist: Some(playlist),
            timestamp: at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn name(raw: &str) -> TechniqueName {
        TechniqueName::new(raw).unwrap()
    }

    #[test]
    fn toggle_flips_membership() {
        let mut flags = FlagSet::new();
        assert_eq!(flags.toggle(name("A")), FlagEventKind::Flag);
        assert!(flags.contains(&name("A")));
        assert_eq!(flags.toggle(name("A")), FlagEventKind::Unflag);
        assert!(flags.is_empty());
    }

    #[test]
    fn from_names_drops_duplicates_and_keeps_order() {
        let flags = FlagSet::from_names([name("B"), name("A"), name("B")]);
        assert_eq!(flags.as_slice(), &[name("B"), name("A")]);
    }

    #[test]
    fn event_kind_round_trips_through_str() {
        for kind in [
            FlagEventKind::Flag,
            FlagEventKind::Unflag,
            FlagEventKind::PlaylistAdd,
            FlagEventKind::PlaylistRemove,
        ] {
            assert_eq!(FlagEventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FlagEventKind::parse("other"), None);
    }

    #[test]
    fn event_serializes_type_key() {
        let event = FlagEvent::flag(FlagEventKind::Flag, name("A"), fixed_now());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "flag");
        assert!(json.get("playlist").is_none());
    }
}
