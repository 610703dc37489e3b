mod history;
mod narration;
mod player;
mod progress;
mod recorder;
mod runtime;

// Public API of the practice-session subsystem.
pub use crate::error::{HistoryError, NarrationError, PlayerClosed};
pub use history::{HistoryService, SessionHistoryItem, SessionSummaryId};
pub use narration::{CommandSpeech, SpeechEngine};
pub use player::{
    AdvanceTimer, FlagLookup, Narrator, NoFlags, PlayerPorts, PlayerState, SessionPlayer, Ticket,
};
pub use progress::PlayerProgress;
pub use recorder::{MemoryRecorder, SessionRecorder, StorageRecorder};
pub use runtime::{PlayerCommand, PlayerConfig, PlayerHandle, PlayerSnapshot, spawn_player};
