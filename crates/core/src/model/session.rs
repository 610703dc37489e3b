use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::TechniqueName;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("session duration does not fit in milliseconds")]
    DurationOverflow,

    #[error("flagged technique {0} was not part of the session")]
    FlaggedNotPracticed(TechniqueName),
}

/// Durable record of one completed practice run.
///
/// Serialized as `{ timestamp, techniques, durationMs, flagged }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSummary")]
pub struct SessionSummary {
    timestamp: DateTime<Utc>,
    techniques: Vec<TechniqueName>,
    duration_ms: u64,
    flagged: Vec<TechniqueName>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSummary {
    timestamp: DateTime<Utc>,
    techniques: Vec<TechniqueName>,
    duration_ms: u64,
    #[serde(default)]
    flagged: Vec<TechniqueName>,
}

impl TryFrom<RawSummary> for SessionSummary {
    type Error = SessionSummaryError;

    fn try_from(raw: RawSummary) -> Result<Self, Self::Error> {
        Self::from_persisted(raw.timestamp, raw.techniques, raw.duration_ms, raw.flagged)
    }
}

impl SessionSummary {
    /// Rehydrate a summary from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::FlaggedNotPracticed` if `flagged` is not a
    /// subset of `techniques`.
    pub fn from_persisted(
        timestamp: DateTime<Utc>,
        techniques: Vec<TechniqueName>,
        duration_ms: u64,
        flagged: Vec<TechniqueName>,
    ) -> Result<Self, SessionSummaryError> {
        if let Some(stray) = flagged.iter().find(|name| !techniques.contains(name)) {
            return Err(SessionSummaryError::FlaggedNotPracticed(stray.clone()));
        }
        Ok(Self {
            timestamp,
            techniques,
            duration_ms,
            flagged,
        })
    }

    /// Build the summary for a run that started at `started_at` and finished
    /// at `completed_at`.
    ///
    /// `flagged` is the intersection of `techniques` with whatever
    /// `is_flagged` reports, kept in practice order.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if the run ends before
    /// it starts.
    pub fn from_run(
        techniques: &[TechniqueName],
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        is_flagged: impl Fn(&TechniqueName) -> bool,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }
        let duration_ms = u64::try_from((completed_at - started_at).num_milliseconds())
            .map_err(|_| SessionSummaryError::DurationOverflow)?;

        let mut flagged: Vec<TechniqueName> = Vec::new();
        for name in techniques {
            if is_flagged(name) && !flagged.contains(name) {
                flagged.push(name.clone());
            }
        }

        Ok(Self {
            timestamp: completed_at,
            techniques: techniques.to_vec(),
            duration_ms,
            flagged,
        })
    }

    /// Completion time of the run.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Start time derived from completion time and duration.
    ///
    /// A duration reaching past the representable range yields the completion time.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        i64::try_from(self.duration_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .and_then(|elapsed| self.timestamp.checked_sub_signed(elapsed))
            .unwrap_or(self.timestamp)
    }

    #[must_use]
    pub fn techniques(&self) -> &[TechniqueName] {
        &self.techniques
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    #[must_use]
    pub fn flagged(&self) -> &[TechniqueName] {
        &self.flagged
    }

    #[must_use]
    pub fn technique_count(&self) -> usize {
        self.techniques.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn names(raw: &[&str]) -> Vec<TechniqueName> {
        raw.iter().map(|n| TechniqueName::new(*n).unwrap()).collect()
    }

    #[test]
    fn from_run_computes_duration_and_flagged_intersection() {
        let items = names(&["A", "B", "C"]);
        let start = fixed_now();
        let end = start + Duration::milliseconds(12_500);
        let summary = SessionSummary::from_run(&items, start, end, |n| {
            n.as_str() == "C" || n.as_str() == "A" || n.as_str() == "Z"
        })
        .unwrap();

        assert_eq!(summary.duration_ms(), 12_500);
        assert_eq!(summary.timestamp(), end);
        assert_eq!(summary.started_at(), start);
        assert_eq!(summary.techniques(), items.as_slice());
        assert_eq!(summary.flagged(), names(&["A", "C"]).as_slice());
    }

    #[test]
    fn from_run_rejects_reversed_range() {
        let now = fixed_now();
        let err = SessionSummary::from_run(&names(&["A"]), now, now - Duration::seconds(1), |_| {
            false
        })
        .unwrap_err();
        assert_eq!(err, SessionSummaryError::InvalidTimeRange);
    }

    #[test]
    fn from_persisted_rejects_stray_flag() {
        let err = SessionSummary::from_persisted(fixed_now(), names(&["A"]), 10, names(&["B"]))
            .unwrap_err();
        assert!(matches!(err, SessionSummaryError::FlaggedNotPracticed(_)));
    }

    #[test]
    fn started_at_survives_out_of_range_duration() {
        let summary =
            SessionSummary::from_persisted(fixed_now(), names(&["A"]), u64::MAX, Vec::new())
                .unwrap();
        assert_eq!(summary.started_at(), fixed_now());

        let huge = u64::try_from(i64::MAX).unwrap();
        let summary =
            SessionSummary::from_persisted(fixed_now(), names(&["A"]), huge, Vec::new()).unwrap();
        assert_eq!(summary.started_at(), fixed_now());
    }

    #[test]
    fn json_shape_uses_camel_case_keys() {
        let summary =
            SessionSummary::from_persisted(fixed_now(), names(&["A", "B"]), 4_000, names(&["B"]))
                .unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["durationMs"], 4_000);
        assert_eq!(json["techniques"][1], "B");
        assert_eq!(json["flagged"][0], "B");

        let back: SessionSummary = serde_json::from_value(json).unwrap();
        assert_eq!(back, summary);
    }
}
