mod flags;
mod ids;
mod playlist;
mod session;
mod settings;
mod technique;
mod view;

pub use ids::{EmptyNameError, PlaylistName, TechniqueName};

pub use flags::{FlagEvent, FlagEventKind, FlagSet};
pub use playlist::{Playlist, PlaylistBook, PlaylistError};
pub use session::{SessionSummary, SessionSummaryError};
pub use settings::{
    DEFAULT_DELAY_MS, PracticeSettings, PracticeSettingsDraft, ReminderTime, SettingsError,
};
pub use technique::{Audience, Facet, Technique};
pub use view::TechniqueView;
