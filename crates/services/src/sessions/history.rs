use chrono::{DateTime, Utc};
use std::sync::Arc;

use dojo_core::model::SessionSummary;
use storage::repository::{SessionSummaryRepository, SessionSummaryRow};

use crate::error::HistoryError;

/// Storage identifier for a persisted session summary (`SQLite` row id).
pub type SessionSummaryId = i64;

/// Presentation-agnostic history row. Formatting is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHistoryItem {
    pub id: SessionSummaryId,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub technique_count: usize,
    pub flagged_count: usize,
}

impl SessionHistoryItem {
    #[must_use]
    pub fn from_row(row: &SessionSummaryRow) -> Self {
        let summary = &row.summary;
        Self {
            id: row.id,
            completed_at: summary.timestamp(),
            duration_ms: summary.duration_ms(),
            technique_count: summary.technique_count(),
            flagged_count: summary.flagged().len(),
        }
    }
}

/// Read and clear the practice log.
#[derive(Clone)]
pub struct HistoryService {
    summaries: Arc<dyn SessionSummaryRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(summaries: Arc<dyn SessionSummaryRepository>) -> Self {
        Self { summaries }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(storage::repository::InMemoryRepository::new()))
    }

    /// Sessions newest first, optionally capped at `limit`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<SessionHistoryItem>, HistoryError> {
        let rows = self.summaries.list_summary_rows().await?;
        let limit = limit.unwrap_or(usize::MAX);
        Ok(rows
            .iter()
            .rev()
            .take(limit)
            .map(SessionHistoryItem::from_row)
            .collect())
    }

    /// Every session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn all(&self) -> Result<Vec<SessionSummary>, HistoryError> {
        let rows = self.summaries.list_summary_rows().await?;
        Ok(rows.into_iter().map(|row| row.summary).collect())
    }

    /// Fetch the session completed at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::NotFound` when no session matches.
    pub async fn get(&self, timestamp: DateTime<Utc>) -> Result<SessionSummary, HistoryError> {
        self.summaries
            .find_summary(timestamp)
            .await?
            .map(|row| row.summary)
            .ok_or(HistoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `HistoryError::Storage` on repository failures.
    pub async fn clear(&self) -> Result<(), HistoryError> {
        self.summaries.clear_summaries().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dojo_core::model::TechniqueName;
    use dojo_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn summary(minutes: i64, names: &[&str], flagged: &[&str]) -> SessionSummary {
        let names = names.iter().map(|n| TechniqueName::new(*n).unwrap()).collect();
        let flagged = flagged
            .iter()
            .map(|n| TechniqueName::new(*n).unwrap())
            .collect();
        SessionSummary::from_persisted(
            fixed_now() + Duration::minutes(minutes),
            names,
            8_000,
            flagged,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn list_recent_is_newest_first_and_limited() {
        let repo = InMemoryRepository::new();
        repo.append_summary(&summary(0, &["A"], &[])).await.unwrap();
        repo.append_summary(&summary(10, &["A", "B"], &["B"]))
            .await
            .unwrap();
        repo.append_summary(&summary(5, &["C"], &[])).await.unwrap();

        let svc = HistoryService::new(Arc::new(repo));
        let items = svc.list_recent(None).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].completed_at, fixed_now() + Duration::minutes(10));
        assert_eq!(items[0].technique_count, 2);
        assert_eq!(items[0].flagged_count, 1);
        assert_eq!(items[2].completed_at, fixed_now());

        let capped = svc.list_recent(Some(1)).await.unwrap();
        assert_eq!(capped.len(), 1);
        assert_eq!(capped[0].id, items[0].id);
    }

    #[tokio::test]
    async fn get_and_clear() {
        let svc = HistoryService::in_memory();
        assert!(matches!(
            svc.get(fixed_now()).await,
            Err(HistoryError::NotFound)
        ));
        assert!(svc.all().await.unwrap().is_empty());
        svc.clear().await.unwrap();
    }

    #[tokio::test]
    async fn get_finds_by_completion_time() {
        let repo = Arc::new(InMemoryRepository::new());
        let stored = summary(3, &["A", "B"], &["A"]);
        repo.append_summary(&stored).await.unwrap();

        let svc = HistoryService::new(repo);
        assert_eq!(svc.get(stored.timestamp()).await.unwrap(), stored);
        svc.clear().await.unwrap();
        assert!(svc.all().await.unwrap().is_empty());
    }
}
