use thiserror::Error;

use crate::model::{EmptyNameError, PlaylistError, SessionSummaryError, SettingsError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Name(#[from] EmptyNameError),
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
