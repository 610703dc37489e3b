use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a name is empty after trimming.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} cannot be empty")]
pub struct EmptyNameError {
    kind: &'static str,
}

/// Unique identifier for a technique: its display name.
///
/// Names are trimmed on construction and never empty.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TechniqueName(String);

impl TechniqueName {
    /// Creates a validated `TechniqueName`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyNameError` if the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyNameError> {
        normalize(value.into(), "technique name").map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique identifier for a playlist.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaylistName(String);

impl PlaylistName {
    /// Creates a validated `PlaylistName`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyNameError` if the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyNameError> {
        normalize(value.into(), "playlist name").map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn normalize(raw: String, kind: &'static str) -> Result<String, EmptyNameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EmptyNameError { kind });
    }
    if trimmed.len() == raw.len() {
        Ok(raw)
    } else {
        Ok(trimmed.to_string())
    }
}

impl fmt::Debug for TechniqueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TechniqueName({:?})", self.0)
    }
}

impl fmt::Debug for PlaylistName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlaylistName({:?})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for TechniqueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PlaylistName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Conversions ───────────────────────────────────────────────────────────────

impl FromStr for TechniqueName {
    type Err = EmptyNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for PlaylistName {
    type Err = EmptyNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TechniqueName {
    type Error = EmptyNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for PlaylistName {
    type Error = EmptyNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TechniqueName> for String {
    fn from(value: TechniqueName) -> Self {
        value.0
    }
}

impl From<PlaylistName> for String {
    fn from(value: PlaylistName) -> Self {
        value.0
    }
}

impl Borrow<str> for TechniqueName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
