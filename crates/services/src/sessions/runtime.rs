//! Runs a [`SessionPlayer`] on tokio.
//!
//! One task owns the player. User commands, narration completions and timer
//! expiries all arrive as messages on channels consumed by that task, so the
//! player is only ever touched from one place.

use std::sync::Arc;
use std::time::Duration;

use dojo_core::model::TechniqueName;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::Clock;
use crate::error::{NarrationError, PlayerClosed};

use super::narration::SpeechEngine;
use super::player::{
    AdvanceTimer, FlagLookup, Narrator, PlayerPorts, PlayerState, SessionPlayer, Ticket,
};
use super::progress::PlayerProgress;
use super::recorder::SessionRecorder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Start,
    Pause,
    Resume,
    Rewind,
    Skip,
}

enum PlayerEvent {
    NarrationFinished(Ticket, Result<(), NarrationError>),
    AdvanceDue(Ticket),
}

/// Published after every change the driver applies.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub state: PlayerState,
    pub current: Option<TechniqueName>,
    pub progress: PlayerProgress,
}

impl PlayerSnapshot {
    fn of(player: &SessionPlayer) -> Self {
        Self {
            state: player.state(),
            current: player.current().cloned(),
            progress: player.progress(),
        }
    }
}

/// Speaks each utterance in its own task; stopping aborts the task.
struct TaskNarrator {
    engine: Arc<dyn SpeechEngine>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    in_flight: Option<JoinHandle<()>>,
}

impl Narrator for TaskNarrator {
    fn speak(&mut self, ticket: Ticket, text: &str) {
        self.stop();
        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        let text = text.to_owned();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = engine.speak(&text).await;
            let _ = events.send(PlayerEvent::NarrationFinished(ticket, outcome));
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

/// One pending sleep at a time; cancel aborts it.
struct TaskTimer {
    events: mpsc::UnboundedSender<PlayerEvent>,
    pending: Option<(Ticket, JoinHandle<()>)>,
}

impl AdvanceTimer for TaskTimer {
    fn schedule(&mut self, ticket: Ticket, delay: Duration) {
        if let Some((_, task)) = self.pending.take() {
            task.abort();
        }
        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(PlayerEvent::AdvanceDue(ticket));
        });
        self.pending = Some((ticket, task));
    }

    fn cancel(&mut self, ticket: Ticket) {
        if self
            .pending
            .as_ref()
            .is_some_and(|(pending, _)| *pending == ticket)
        {
            if let Some((_, task)) = self.pending.take() {
                task.abort();
            }
        }
    }
}

/// Everything needed to spawn a driven player.
pub struct PlayerConfig {
    pub items: Vec<TechniqueName>,
    pub delay: Duration,
    pub clock: Clock,
    pub engine: Arc<dyn SpeechEngine>,
    pub flags: Arc<dyn FlagLookup>,
    pub recorder: Arc<dyn SessionRecorder>,
}

/// Cheap, cloneable remote control for a spawned player.
///
/// The driver stops when every handle is dropped.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    snapshots: watch::Receiver<PlayerSnapshot>,
}

impl PlayerHandle {
    /// # Errors
    ///
    /// Returns `PlayerClosed` if the driver task has stopped.
    pub fn send(&self, command: PlayerCommand) -> Result<(), PlayerClosed> {
        self.commands.send(command).map_err(|_| PlayerClosed)
    }

    /// # Errors
    ///
    /// Returns `PlayerClosed` if the driver task has stopped.
    pub fn start(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::Start)
    }

    /// # Errors
    ///
    /// Returns `PlayerClosed` if the driver task has stopped.
    pub fn pause(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::Pause)
    }

    /// # Errors
    ///
    /// Returns `PlayerClosed` if the driver task has stopped.
    pub fn resume(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::Resume)
    }

    /// # Errors
    ///
    /// Returns `PlayerClosed` if the driver task has stopped.
    pub fn rewind(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::Rewind)
    }

    /// # Errors
    ///
    /// Returns `PlayerClosed` if the driver task has stopped.
    pub fn skip(&self) -> Result<(), PlayerClosed> {
        self.send(PlayerCommand::Skip)
    }

    #[must_use]
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified after every applied command or event.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }
}

/// Spawn the driver task. Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_player(config: PlayerConfig) -> (PlayerHandle, JoinHandle<()>) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    let ports = PlayerPorts {
        narrator: Box::new(TaskNarrator {
            engine: config.engine,
            events: event_tx.clone(),
            in_flight: None,
        }),
        timer: Box::new(TaskTimer {
            events: event_tx,
            pending: None,
        }),
        flags: config.flags,
        recorder: config.recorder,
    };
    let player = SessionPlayer::new(config.items, config.delay, config.clock, ports);
    let (snapshot_tx, snapshot_rx) = watch::channel(PlayerSnapshot::of(&player));

    let task = tokio::spawn(drive(player, command_rx, event_rx, snapshot_tx));
    let handle = PlayerHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
    };
    (handle, task)
}

async fn drive(
    mut player: SessionPlayer,
    mut commands: mpsc::UnboundedReceiver<PlayerCommand>,
    mut events: mpsc::UnboundedReceiver<PlayerEvent>,
    snapshots: watch::Sender<PlayerSnapshot>,
) {
    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };
                log::debug!("player command {command:?}");
                match command {
                    PlayerCommand::Start => player.start(),
                    PlayerCommand::Pause => player.pause(),
                    PlayerCommand::Resume => player.resume(),
                    PlayerCommand::Rewind => player.rewind(),
                    PlayerCommand::Skip => player.skip(),
                }
            }
            Some(event) = events.recv() => match event {
                PlayerEvent::NarrationFinished(ticket, outcome) => {
                    player.narration_finished(ticket, outcome);
                }
                PlayerEvent::AdvanceDue(ticket) => player.advance_due(ticket),
            },
        }
        snapshots.send_replace(PlayerSnapshot::of(&player));
    }

    player.close();
    snapshots.send_replace(PlayerSnapshot::of(&player));
}
