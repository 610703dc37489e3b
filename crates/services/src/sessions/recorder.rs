use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use dojo_core::model::SessionSummary;
use storage::repository::SessionSummaryRepository;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::HistoryError;

/// Sink for completed practice sessions.
///
/// `record` is fire-and-forget: persistence failures are logged and never
/// reach the player.
#[async_trait]
pub trait SessionRecorder: Send + Sync {
    fn record(&self, summary: SessionSummary);

    /// Recorded sessions, most recent last.
    async fn history(&self) -> Result<Vec<SessionSummary>, HistoryError>;
}

/// Writes summaries through a `SessionSummaryRepository` on the tokio runtime.
pub struct StorageRecorder {
    summaries: Arc<dyn SessionSummaryRepository>,
    runtime: Handle,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl StorageRecorder {
    #[must_use]
    pub fn new(summaries: Arc<dyn SessionSummaryRepository>, runtime: Handle) -> Self {
        Self {
            summaries,
            runtime,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Wait for every write issued so far.
    pub async fn flush(&self) {
        let pending = std::mem::take(
            &mut *self
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for write in pending {
            if let Err(err) = write.await {
                log::error!("practice session write task failed: {err}");
            }
        }
    }
}

#[async_trait]
impl SessionRecorder for StorageRecorder {
    fn record(&self, summary: SessionSummary) {
        let summaries = Arc::clone(&self.summaries);
        let write = self.runtime.spawn(async move {
            match summaries.append_summary(&summary).await {
                Ok(id) => log::debug!("recorded practice session {id}"),
                Err(err) => log::error!("failed to record practice session: {err}"),
            }
        });

        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pending.retain(|task| !task.is_finished());
        pending.push(write);
    }

    async fn history(&self) -> Result<Vec<SessionSummary>, HistoryError> {
        let rows = self.summaries.list_summary_rows().await?;
        Ok(rows.into_iter().map(|row| row.summary).collect())
    }
}

/// Keeps summaries in memory. Clones share the same list.
#[derive(Clone, Default)]
pub struct MemoryRecorder {
    recorded: Arc<Mutex<Vec<SessionSummary>>>,
}

impl MemoryRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recorded(&self) -> Vec<SessionSummary> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SessionRecorder for MemoryRecorder {
    fn record(&self, summary: SessionSummary) {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(summary);
    }

    async fn history(&self) -> Result<Vec<SessionSummary>, HistoryError> {
        Ok(self.recorded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dojo_core::model::TechniqueName;
    use dojo_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn summary(name: &str) -> SessionSummary {
        SessionSummary::from_persisted(
            fixed_now(),
            vec![TechniqueName::new(name).unwrap()],
            4_000,
            Vec::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn storage_recorder_persists_in_background() {
        let repo = Arc::new(InMemoryRepository::new());
        let recorder = StorageRecorder::new(repo.clone(), Handle::current());

        recorder.record(summary("A"));
        recorder.record(summary("B"));
        recorder.flush().await;

        let history = recorder.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], summary("A"));
        assert_eq!(repo.list_summary_rows().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn memory_recorder_shares_state_between_clones() {
        let recorder = MemoryRecorder::new();
        let handle = recorder.clone();
        handle.record(summary("A"));
        assert_eq!(recorder.history().await.unwrap(), vec![summary("A")]);
    }
}
