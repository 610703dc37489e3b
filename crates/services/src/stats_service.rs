use std::sync::Arc;

use dojo_core::stats::PracticeStats;
use storage::repository::{FlagRepository, SessionSummaryRepository, Storage, TechniqueViewRepository};

use crate::error::StatsError;

/// Computes the statistics screen from history, views and flag events.
#[derive(Clone)]
pub struct StatsService {
    summaries: Arc<dyn SessionSummaryRepository>,
    views: Arc<dyn TechniqueViewRepository>,
    flags: Arc<dyn FlagRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(storage: &Storage) -> Self {
        Self {
            summaries: Arc::clone(&storage.session_summaries),
            views: Arc::clone(&storage.views),
            flags: Arc::clone(&storage.flags),
        }
    }

    /// # Errors
    ///
    /// Returns `StatsError::Storage` on repository failures.
    pub async fn compute(&self) -> Result<PracticeStats, StatsError> {
        let history: Vec<_> = self
            .summaries
            .list_summary_rows()
            .await?
            .into_iter()
            .map(|row| row.summary)
            .collect();
        let views = self.views.list_views().await?;
        let events = self.flags.list_flag_events().await?;
        Ok(PracticeStats::compute(&history, &views, &events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dojo_core::model::{SessionSummary, TechniqueName, TechniqueView};
    use dojo_core::stats::Achievement;
    use dojo_core::time::fixed_now;

    #[tokio::test]
    async fn empty_storage_yields_zeroes() {
        let svc = StatsService::new(&Storage::in_memory());
        let stats = svc.compute().await.unwrap();
        assert_eq!(stats, PracticeStats::default());
        assert_eq!(stats.longest_streak, 0);
    }

    #[tokio::test]
    async fn five_daily_sessions_earn_streak_badges() {
        let storage = Storage::in_memory();
        let name = TechniqueName::new("Bear Hug").unwrap();
        for day in 0..5 {
            let summary = SessionSummary::from_persisted(
                fixed_now() - Duration::days(day),
                vec![name.clone()],
                4_000,
                Vec::new(),
            )
            .unwrap();
            storage.session_summaries.append_summary(&summary).await.unwrap();
        }
        storage
            .views
            .append_view(&TechniqueView::new(name.clone(), fixed_now()))
            .await
            .unwrap();

        let stats = StatsService::new(&storage).compute().await.unwrap();
        assert_eq!(stats.total_sessions, 5);
        assert_eq!(stats.longest_streak, 5);
        assert_eq!(stats.most_practiced, vec![(name.clone(), 5)]);
        assert_eq!(stats.most_viewed, vec![(name, 1)]);
        assert!(stats.achievements.contains(&Achievement::WarmingUp));
        assert!(stats.achievements.contains(&Achievement::MomentumBuilder));
    }
}
