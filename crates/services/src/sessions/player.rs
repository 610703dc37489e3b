use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dojo_core::model::{SessionSummary, TechniqueName};

use crate::Clock;
use crate::error::NarrationError;

use super::progress::PlayerProgress;
use super::recorder::SessionRecorder;

/// Tags one narration request or one scheduled advance.
///
/// Completions carrying a ticket the player no longer waits for are dropped,
/// so a late callback can never move the cursor twice.
pub type Ticket = u64;

/// Narration capability driven by the player.
///
/// `speak` must eventually be answered with
/// [`SessionPlayer::narration_finished`] using the same ticket, unless `stop`
/// is called first.
pub trait Narrator: Send {
    fn speak(&mut self, ticket: Ticket, text: &str);
    fn stop(&mut self);
}

/// Cancellable one-shot timer. When it fires the owner calls
/// [`SessionPlayer::advance_due`] with the scheduled ticket.
pub trait AdvanceTimer: Send {
    fn schedule(&mut self, ticket: Ticket, delay: Duration);
    fn cancel(&mut self, ticket: Ticket);
}

/// Source of the user's flagged set, read when a run completes.
pub trait FlagLookup: Send + Sync {
    fn is_flagged(&self, name: &TechniqueName) -> bool;
}

/// No technique is flagged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFlags;

impl FlagLookup for NoFlags {
    fn is_flagged(&self, _name: &TechniqueName) -> bool {
        false
    }
}

/// Coarse player state derived from cursor and play flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Idle,
    Playing,
    Paused,
    Finished,
}

/// Collaborators the player talks to.
pub struct PlayerPorts {
    pub narrator: Box<dyn Narrator>,
    pub timer: Box<dyn AdvanceTimer>,
    pub flags: Arc<dyn FlagLookup>,
    pub recorder: Arc<dyn SessionRecorder>,
}

/// Sequential practice player.
///
/// Narrates `items` one at a time with `delay` between the end of one
/// narration and the start of the next. The player never blocks or sleeps:
/// narration completion and timer expiry arrive as explicit calls, which keeps
/// it usable from a single event loop and deterministic in tests.
pub struct SessionPlayer {
    items: Vec<TechniqueName>,
    cursor: usize,
    playing: bool,
    delay: Duration,
    session_start: Option<DateTime<Utc>>,
    clock: Clock,
    next_ticket: Ticket,
    narration: Option<Ticket>,
    pending_advance: Option<Ticket>,
    ports: PlayerPorts,
}

impl SessionPlayer {
    /// `delay` is read once here; later settings changes do not affect this player.
    #[must_use]
    pub fn new(items: Vec<TechniqueName>, delay: Duration, clock: Clock, ports: PlayerPorts) -> Self {
        Self {
            items,
            cursor: 0,
            playing: false,
            delay,
            session_start: None,
            clock,
            next_ticket: 0,
            narration: None,
            pending_advance: None,
            ports,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[TechniqueName] {
        &self.items
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    #[must_use]
    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    /// Item under the cursor, `None` once finished or for an empty list.
    #[must_use]
    pub fn current(&self) -> Option<&TechniqueName> {
        self.items.get(self.cursor)
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Lets tests move a fixed clock between narration steps.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[must_use]
    pub fn state(&self) -> PlayerState {
        if self.items.is_empty() {
            PlayerState::Idle
        } else if self.cursor >= self.items.len() {
            PlayerState::Finished
        } else if self.playing {
            PlayerState::Playing
        } else if self.cursor == 0 && self.session_start.is_none() {
            PlayerState::Idle
        } else {
            PlayerState::Paused
        }
    }

    #[must_use]
    pub fn progress(&self) -> PlayerProgress {
        PlayerProgress::new(self.cursor, self.items.len(), self.playing)
    }

    /// Start or resume playback.
    ///
    /// A finished player starts over from the first item as a new session.
    /// Starting a fresh run stamps the session start; resuming a paused run
    /// keeps the original one, even at the first item. No-op while already
    /// playing.
    pub fn start(&mut self) {
        if self.items.is_empty() || self.playing {
            return;
        }
        if self.cursor >= self.items.len() {
            self.cursor = 0;
        }
        self.playing = true;
        if self.cursor == 0 && self.session_start.is_none() {
            self.session_start = Some(self.clock.now());
        }
        self.narrate_current();
    }

    /// Re-narrates the current item without moving the cursor.
    pub fn resume(&mut self) {
        self.start();
    }

    pub fn pause(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.playing = false;
        self.cancel_pending_advance();
        self.stop_narration();
    }

    /// Step back one item, clamped at the first.
    pub fn rewind(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.cancel_pending_advance();
        self.stop_narration();
        self.cursor = self.cursor.saturating_sub(1);
        if self.playing {
            self.narrate_current();
        }
    }

    /// Step forward one item, clamped at the last.
    ///
    /// Reaching the last index this way stops playback but does not complete
    /// the run. It stays resumable from that item, keeping its session start,
    /// and a summary is recorded only once the last item has been narrated.
    pub fn skip(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.cancel_pending_advance();
        self.stop_narration();

        let last = self.items.len() - 1;
        self.cursor = self.cursor.max((self.cursor + 1).min(last));
        if self.cursor >= last {
            self.playing = false;
        } else if self.playing {
            self.narrate_current();
        }
    }

    /// Release the narrator and timer when the practice view goes away.
    ///
    /// An unfinished run is abandoned without a summary.
    pub fn close(&mut self) {
        self.playing = false;
        self.cancel_pending_advance();
        self.stop_narration();
        self.session_start = None;
    }

    /// Narration for `ticket` ended. Failures count as completion.
    pub fn narration_finished(&mut self, ticket: Ticket, outcome: Result<(), NarrationError>) {
        if self.narration != Some(ticket) {
            log::debug!("ignoring stale narration completion {ticket}");
            return;
        }
        self.narration = None;

        if let Err(err) = outcome {
            log::warn!("narration failed, continuing: {err}");
        }
        if !self.playing {
            return;
        }

        if self.cursor + 1 < self.items.len() {
            let ticket = self.issue_ticket();
            self.pending_advance = Some(ticket);
            self.ports.timer.schedule(ticket, self.delay);
        } else {
            self.finish();
        }
    }

    /// The advance scheduled under `ticket` is due.
    pub fn advance_due(&mut self, ticket: Ticket) {
        if self.pending_advance != Some(ticket) || !self.playing {
            log::debug!("ignoring stale advance {ticket}");
            return;
        }
        self.pending_advance = None;
        self.cursor += 1;
        self.narrate_current();
    }

    fn finish(&mut self) {
        self.cursor = self.items.len();
        self.playing = false;

        let Some(started_at) = self.session_start.take() else {
            return;
        };
        let completed_at = self.clock.now().max(started_at);
        let flags = Arc::clone(&self.ports.flags);
        match SessionSummary::from_run(&self.items, started_at, completed_at, |name| {
            flags.is_flagged(name)
        }) {
            Ok(summary) => self.ports.recorder.record(summary),
            Err(err) => log::error!("could not build practice summary: {err}"),
        }
    }

    fn narrate_current(&mut self) {
        self.cancel_pending_advance();
        self.stop_narration();

        let Some(item) = self.items.get(self.cursor) else {
            return;
        };
        let text = item.as_str().to_owned();
        let ticket = self.issue_ticket();
        self.narration = Some(ticket);
        self.ports.narrator.speak(ticket, &text);
    }

    fn stop_narration(&mut self) {
        if self.narration.take().is_some() {
            self.ports.narrator.stop();
        }
    }

    fn cancel_pending_advance(&mut self) {
        if let Some(ticket) = self.pending_advance.take() {
            self.ports.timer.cancel(ticket);
        }
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        self.next_ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::recorder::MemoryRecorder;
    use dojo_core::time::fixed_clock;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<String>>>);

    impl Calls {
        fn push(&self, call: String) {
            self.0.lock().unwrap().push(call);
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    struct FakeNarrator(Calls);

    impl Narrator for FakeNarrator {
        fn speak(&mut self, ticket: Ticket, text: &str) {
            self.0.push(format!("speak {ticket} {text}"));
        }

        fn stop(&mut self) {
            self.0.push("stop".into());
        }
    }

    struct FakeTimer(Calls);

    impl AdvanceTimer for FakeTimer {
        fn schedule(&mut self, ticket: Ticket, _delay: Duration) {
            self.0.push(format!("schedule {ticket}"));
        }

        fn cancel(&mut self, ticket: Ticket) {
            self.0.push(format!("cancel {ticket}"));
        }
    }

    fn player(names: &[&str]) -> (SessionPlayer, Calls, MemoryRecorder) {
        let calls = Calls::default();
        let recorder = MemoryRecorder::new();
        let ports = PlayerPorts {
            narrator: Box::new(FakeNarrator(calls.clone())),
            timer: Box::new(FakeTimer(calls.clone())),
            flags: Arc::new(NoFlags),
            recorder: Arc::new(recorder.clone()),
        };
        let items = names
            .iter()
            .map(|n| TechniqueName::new(*n).unwrap())
            .collect();
        let player = SessionPlayer::new(items, Duration::from_millis(10), fixed_clock(), ports);
        (player, calls, recorder)
    }

    #[test]
    fn start_narrates_first_item_and_stamps_session() {
        let (mut p, calls, _) = player(&["A", "B"]);
        assert_eq!(p.state(), PlayerState::Idle);
        p.start();
        assert_eq!(calls.take(), vec!["speak 1 A"]);
        assert_eq!(p.state(), PlayerState::Playing);
        assert_eq!(p.session_start(), Some(p.clock().now()));

        p.start();
        assert!(calls.take().is_empty());
    }

    #[test]
    fn stale_completion_does_not_double_advance() {
        let (mut p, calls, _) = player(&["A", "B", "C"]);
        p.start();
        p.narration_finished(1, Ok(()));
        assert_eq!(calls.take(), vec!["speak 1 A", "schedule 2"]);

        p.narration_finished(1, Ok(()));
        p.advance_due(2);
        p.advance_due(2);
        assert_eq!(p.cursor(), 1);
        assert_eq!(calls.take(), vec!["speak 3 B"]);
    }

    #[test]
    fn pause_stops_narration_and_keeps_position() {
        let (mut p, calls, _) = player(&["A", "B"]);
        p.start();
        p.pause();
        assert_eq!(calls.take(), vec!["speak 1 A", "stop"]);
        assert_eq!(p.state(), PlayerState::Paused);

        // Completion of the stopped utterance is ignored.
        p.narration_finished(1, Ok(()));
        assert_eq!(p.cursor(), 0);
        assert!(calls.take().is_empty());
    }

    #[test]
    fn resume_at_first_item_keeps_session_start() {
        let (mut p, _, _) = player(&["A", "B"]);
        p.start();
        let started = p.session_start();
        p.pause();
        p.clock_mut().advance(chrono::Duration::seconds(30));
        p.resume();
        assert_eq!(p.session_start(), started);
        assert_eq!(p.state(), PlayerState::Playing);
    }

    #[test]
    fn skip_onto_last_item_stops_without_summary() {
        let (mut p, calls, recorder) = player(&["A", "B"]);
        p.start();
        p.skip();
        assert_eq!(p.cursor(), 1);
        assert!(!p.is_playing());
        assert_eq!(calls.take(), vec!["speak 1 A", "stop"]);
        assert!(recorder.recorded().is_empty());
        assert!(p.session_start().is_some());

        p.start();
        p.narration_finished(2, Ok(()));
        assert_eq!(p.state(), PlayerState::Finished);
        assert_eq!(recorder.recorded().len(), 1);
    }

    #[test]
    fn close_abandons_the_run() {
        let (mut p, calls, recorder) = player(&["A", "B"]);
        p.start();
        p.narration_finished(1, Ok(()));
        p.close();
        assert_eq!(calls.take(), vec!["speak 1 A", "schedule 2", "cancel 2"]);
        assert_eq!(p.session_start(), None);
        p.advance_due(2);
        assert_eq!(p.cursor(), 0);
        assert!(recorder.recorded().is_empty());
    }
}
