//! Practice statistics and achievement badges.

use chrono::NaiveDate;

use crate::model::{FlagEvent, FlagEventKind, SessionSummary, TechniqueName, TechniqueView};

/// How many entries the "most ..." leaderboards keep.
pub const LEADERBOARD_SIZE: usize = 5;

//
// ─── ACHIEVEMENTS ──────────────────────────────────────────────────────────────
//

/// Counters achievements are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementInputs {
    pub sessions: usize,
    pub techniques: usize,
    pub views: usize,
    pub playlist_adds: usize,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Achievement {
    GettingStarted,
    WarmingUp,
    FormingHabit,
    StayingConsistent,
    DedicatedPractitioner,
    EnduranceEngine,
    OrganizedMind,
    CuriositySparked,
    MomentumBuilder,
}

impl Achievement {
    pub const ALL: [Achievement; 9] = [
        Achievement::GettingStarted,
        Achievement::WarmingUp,
        Achievement::FormingHabit,
        Achievement::StayingConsistent,
        Achievement::DedicatedPractitioner,
        Achievement::EnduranceEngine,
        Achievement::OrganizedMind,
        Achievement::CuriositySparked,
        Achievement::MomentumBuilder,
    ];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Achievement::GettingStarted => "getting-started",
            Achievement::WarmingUp => "warming-up",
            Achievement::FormingHabit => "forming-habit",
            Achievement::StayingConsistent => "staying-consistent",
            Achievement::DedicatedPractitioner => "dedicated-practitioner",
            Achievement::EnduranceEngine => "endurance-engine",
            Achievement::OrganizedMind => "organized-mind",
            Achievement::CuriositySparked => "curiosity-sparked",
            Achievement::MomentumBuilder => "momentum-builder",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Achievement::GettingStarted => "Getting Started",
            Achievement::WarmingUp => "Warming Up",
            Achievement::FormingHabit => "Forming a Habit",
            Achievement::StayingConsistent => "Staying Consistent",
            Achievement::DedicatedPractitioner => "Dedicated Practitioner",
            Achievement::EnduranceEngine => "Endurance Engine",
            Achievement::OrganizedMind => "Organized Mind",
            Achievement::CuriositySparked => "Curiosity Sparked",
            Achievement::MomentumBuilder => "Momentum Builder",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Achievement::GettingStarted => "Completed your first practice session.",
            Achievement::WarmingUp => "Completed 5 total sessions.",
            Achievement::FormingHabit => "Practiced 20 techniques in total.",
            Achievement::StayingConsistent => "Practiced 100 techniques in total.",
            Achievement::DedicatedPractitioner => "Completed 50 sessions. That's dedication.",
            Achievement::EnduranceEngine => "Practiced 250 techniques total. Keep grinding!",
            Achievement::OrganizedMind => "Created 10+ playlists to structure your practice.",
            Achievement::CuriositySparked => "Viewed 100 techniques in the detail screen.",
            Achievement::MomentumBuilder => "Practiced at least 5 days in a row.",
        }
    }

    #[must_use]
    pub fn is_earned(self, s: &AchievementInputs) -> bool {
        match self {
            Achievement::GettingStarted => s.sessions >= 1,
            Achievement::WarmingUp => s.sessions >= 5,
            Achievement::FormingHabit => s.techniques >= 20,
            Achievement::StayingConsistent => s.techniques >= 100,
            Achievement::DedicatedPractitioner => s.sessions >= 50,
            Achievement::EnduranceEngine => s.techniques >= 250,
            Achievement::OrganizedMind => s.playlist_adds >= 10,
            Achievement::CuriositySparked => s.views >= 100,
            Achievement::MomentumBuilder => s.longest_streak >= 5,
        }
    }
}

/// Badges earned for the given counters, in display order.
#[must_use]
pub fn earned_achievements(inputs: &AchievementInputs) -> Vec<Achievement> {
    Achievement::ALL
        .into_iter()
        .filter(|a| a.is_earned(inputs))
        .collect()
}

//
// ─── STREAKS ───────────────────────────────────────────────────────────────────
//

/// Longest run of consecutive UTC days with at least one session.
///
/// Returns 0 when there are no sessions.
#[must_use]
pub fn longest_streak(sessions: &[SessionSummary]) -> u32 {
    let mut days: Vec<NaiveDate> = sessions.iter().map(|s| s.timestamp().date_naive()).collect();
    days.sort_unstable();
    days.dedup();

    let Some(first) = days.first().copied() else {
        return 0;
    };

    let mut longest = 1_u32;
    let mut current = 1_u32;
    let mut prev = first;
    for day in days.into_iter().skip(1) {
        if prev.succ_opt() == Some(day) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 1;
        }
        prev = day;
    }
    longest
}

//
// ─── TALLIES ───────────────────────────────────────────────────────────────────
//

/// Count occurrences, keeping first-seen order for ties, and return the top `n`.
pub fn top_counts<'a>(
    names: impl IntoIterator<Item = &'a TechniqueName>,
    n: usize,
) -> Vec<(TechniqueName, usize)> {
    let mut counts: Vec<(TechniqueName, usize)> = Vec::new();
    for name in names {
        match counts.iter_mut().find(|(seen, _)| seen == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

/// Aggregated figures for the statistics screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeStats {
    pub total_sessions: usize,
    pub total_techniques: usize,
    pub unique_techniques: usize,
    pub total_views: usize,
    pub total_flags: usize,
    pub total_playlist_adds: usize,
    pub longest_streak: u32,
    pub most_practiced: Vec<(TechniqueName, usize)>,
    pub most_viewed: Vec<(TechniqueName, usize)>,
    pub most_flagged: Vec<(TechniqueName, usize)>,
    pub most_playlisted: Vec<(TechniqueName, usize)>,
    pub achievements: Vec<Achievement>,
}

impl PracticeStats {
    #[must_use]
    pub fn compute(
        history: &[SessionSummary],
        views: &[TechniqueView],
        events: &[FlagEvent],
    ) -> Self {
        let practiced: Vec<&TechniqueName> =
            history.iter().flat_map(|s| s.techniques().iter()).collect();
        let mut unique: Vec<&TechniqueName> = practiced.clone();
        unique.sort_unstable();
        unique.dedup();

        let of_kind = |kind: FlagEventKind| {
            events
                .iter()
                .filter(move |e| e.kind == kind)
                .map(|e| &e.technique)
        };

        let total_flags = of_kind(FlagEventKind::Flag).count();
        let total_playlist_adds = of_kind(FlagEventKind::PlaylistAdd).count();
        let longest_streak = longest_streak(history);

        let inputs = AchievementInputs {
            sessions: history.len(),
            techniques: practiced.len(),
            views: views.len(),
            playlist_adds: total_playlist_adds,
            longest_streak,
        };

        Self {
            total_sessions: history.len(),
            total_techniques: practiced.len(),
            unique_techniques: unique.len(),
            total_views: views.len(),
            total_flags,
            total_playlist_adds,
            longest_streak,
            most_practiced: top_counts(practiced.iter().copied(), LEADERBOARD_SIZE),
            most_viewed: top_counts(views.iter().map(|v| &v.name), LEADERBOARD_SIZE),
            most_flagged: top_counts(of_kind(FlagEventKind::Flag), LEADERBOARD_SIZE),
            most_playlisted: top_counts(of_kind(FlagEventKind::PlaylistAdd), LEADERBOARD_SIZE),
            achievements: earned_achievements(&inputs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlaylistName;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn tn(raw: &str) -> TechniqueName {
        TechniqueName::new(raw).unwrap()
    }

    fn session(days_ago: i64, names: &[&str]) -> SessionSummary {
        let techniques = names.iter().map(|n| tn(n)).collect();
        SessionSummary::from_persisted(
            fixed_now() - Duration::days(days_ago),
            techniques,
            1_000,
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn streak_is_zero_without_sessions() {
        assert_eq!(longest_streak(&[]), 0);
    }

    #[test]
    fn streak_counts_consecutive_days_once() {
        let history = vec![
            session(10, &["A"]),
            session(4, &["A"]),
            session(3, &["A"]),
            session(3, &["B"]),
            session(2, &["A"]),
            session(0, &["A"]),
        ];
        assert_eq!(longest_streak(&history), 3);
    }

    #[test]
    fn achievements_follow_thresholds() {
        let none = AchievementInputs::default();
        assert!(earned_achievements(&none).is_empty());

        let inputs = AchievementInputs {
            sessions: 5,
            techniques: 20,
            views: 0,
            playlist_adds: 10,
            longest_streak: 5,
        };
        let earned = earned_achievements(&inputs);
        assert_eq!(
            earned,
            vec![
                Achievement::GettingStarted,
                Achievement::WarmingUp,
                Achievement::FormingHabit,
                Achievement::OrganizedMind,
                Achievement::MomentumBuilder,
            ]
        );
    }

    #[test]
    fn top_counts_orders_by_count_then_first_seen() {
        let names = [tn("B"), tn("A"), tn("A"), tn("C"), tn("B"), tn("D")];
        let top = top_counts(names.iter(), 3);
        assert_eq!(top, vec![(tn("B"), 2), (tn("A"), 2), (tn("C"), 1)]);
    }

    #[test]
    fn compute_aggregates_history_views_and_events() {
        let history = vec![session(1, &["A", "B"]), session(0, &["A"])];
        let views = vec![TechniqueView::new(tn("B"), fixed_now())];
        let events = vec![
            FlagEvent::flag(FlagEventKind::Flag, tn("A"), fixed_now()),
            FlagEvent::flag(FlagEventKind::Unflag, tn("A"), fixed_now()),
            FlagEvent::playlist(
                FlagEventKind::PlaylistAdd,
                tn("B"),
                PlaylistName::new("Warmup").unwrap(),
                fixed_now(),
            ),
        ];

        let stats = PracticeStats::compute(&history, &views, &events);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_techniques, 3);
        assert_eq!(stats.unique_techniques, 2);
        assert_eq!(stats.total_views, 1);
        assert_eq!(stats.total_flags, 1);
        assert_eq!(stats.total_playlist_adds, 1);
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(stats.most_practiced[0], (tn("A"), 2));
        assert_eq!(stats.most_flagged, vec![(tn("A"), 1)]);
        assert_eq!(stats.most_playlisted, vec![(tn("B"), 1)]);
        assert_eq!(stats.achievements, vec![Achievement::GettingStarted]);
    }
}
