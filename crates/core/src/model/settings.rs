use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default pause between narrated techniques.
pub const DEFAULT_DELAY_MS: u32 = 4_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("delay between techniques must be > 0 ms")]
    InvalidDelay,

    #[error("reminder hour must be between 0 and 23, got {0}")]
    InvalidReminderHour(u8),

    #[error("reminder minute must be between 0 and 59, got {0}")]
    InvalidReminderMinute(u8),
}

/// Daily practice reminder time (local wall clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTime {
    hour: u8,
    minute: u8,
}

impl ReminderTime {
    /// # Errors
    ///
    /// Returns `SettingsError` if hour or minute is out of range.
    pub fn new(hour: u8, minute: u8) -> Result<Self, SettingsError> {
        if hour > 23 {
            return Err(SettingsError::InvalidReminderHour(hour));
        }
        if minute > 59 {
            return Err(SettingsError::InvalidReminderMinute(minute));
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub fn minute(&self) -> u8 {
        self.minute
    }
}

/// User-configurable practice settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PracticeSettings {
    delay_ms: u32,
    reminder: Option<ReminderTime>,
}

#[derive(Clone, Debug, Default)]
pub struct PracticeSettingsDraft {
    pub delay_ms: Option<u32>,
    pub reminder_hour: Option<u8>,
    pub reminder_minute: Option<u8>,
}

impl PracticeSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft. A missing delay falls back to the default;
    /// a reminder needs both hour and minute.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for a zero delay or an out-of-range reminder.
    pub fn validate(self) -> Result<PracticeSettings, SettingsError> {
        let delay_ms = self.delay_ms.unwrap_or(DEFAULT_DELAY_MS);
        if delay_ms == 0 {
            return Err(SettingsError::InvalidDelay);
        }
        let reminder = match (self.reminder_hour, self.reminder_minute) {
            (Some(hour), Some(minute)) => Some(ReminderTime::new(hour, minute)?),
            _ => None,
        };
        Ok(PracticeSettings { delay_ms, reminder })
    }
}

impl PracticeSettings {
    #[must_use]
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.delay_ms))
    }

    #[must_use]
    pub fn reminder(&self) -> Option<ReminderTime> {
        self.reminder
    }

    #[must_use]
    pub fn to_draft(&self) -> PracticeSettingsDraft {
        PracticeSettingsDraft {
            delay_ms: Some(self.delay_ms),
            reminder_hour: self.reminder.map(|r| r.hour),
            reminder_minute: self.reminder.map(|r| r.minute),
        }
    }
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
            reminder: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_uses_default_delay() {
        let settings = PracticeSettingsDraft::new().validate().unwrap();
        assert_eq!(settings.delay_ms(), DEFAULT_DELAY_MS);
        assert_eq!(settings.delay(), Duration::from_secs(4));
        assert_eq!(settings.reminder(), None);
    }

    #[test]
    fn zero_delay_is_rejected() {
        let draft = PracticeSettingsDraft {
            delay_ms: Some(0),
            ..PracticeSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::InvalidDelay);
    }

    #[test]
    fn reminder_is_range_checked() {
        assert_eq!(
            ReminderTime::new(24, 0).unwrap_err(),
            SettingsError::InvalidReminderHour(24)
        );
        assert_eq!(
            ReminderTime::new(7, 60).unwrap_err(),
            SettingsError::InvalidReminderMinute(60)
        );
        let draft = PracticeSettingsDraft {
            delay_ms: Some(2_500),
            reminder_hour: Some(18),
            reminder_minute: Some(30),
        };
        let settings = draft.validate().unwrap();
        assert_eq!(settings.reminder().map(|r| (r.hour(), r.minute())), Some((18, 30)));
    }

    #[test]
    fn half_set_reminder_is_dropped() {
        let draft = PracticeSettingsDraft {
            delay_ms: None,
            reminder_hour: Some(9),
            reminder_minute: None,
        };
        assert_eq!(draft.validate().unwrap().reminder(), None);
    }
}
