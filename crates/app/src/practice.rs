//! Terminal front end for a practice session.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dojo_core::model::TechniqueName;
use services::sessions::{FlagLookup, PlayerState};
use services::{
    Clock, NarrationError, PlayerConfig, PlayerHandle, PlayerSnapshot, SessionRecorder,
    SpeechEngine, spawn_player,
};
use tokio::sync::mpsc;

/// Prints each technique and holds for roughly the time it takes to say it.
pub struct ConsoleSpeech {
    pace: Duration,
}

impl ConsoleSpeech {
    pub fn new(pace: Duration) -> Self {
        Self { pace }
    }
}

#[async_trait]
impl SpeechEngine for ConsoleSpeech {
    async fn speak(&self, text: &str) -> Result<(), NarrationError> {
        println!("  >> {text}");
        tokio::time::sleep(self.pace).await;
        Ok(())
    }
}

pub struct PracticeRun {
    pub items: Vec<TechniqueName>,
    pub delay: Duration,
    pub clock: Clock,
    pub engine: Arc<dyn SpeechEngine>,
    pub flags: Arc<dyn FlagLookup>,
    pub recorder: Arc<dyn SessionRecorder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Pause,
    Resume,
    Back,
    Skip,
    Quit,
}

impl Key {
    fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "p" => Some(Self::Pause),
            "r" => Some(Self::Resume),
            "b" => Some(Self::Back),
            "s" | "n" => Some(Self::Skip),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Stdin is read on a plain thread so a pending read never holds up shutdown.
fn spawn_keyboard() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn apply(handle: &PlayerHandle, key: Key) -> Result<(), services::PlayerClosed> {
    match key {
        Key::Pause => handle.pause(),
        Key::Resume => handle.resume(),
        Key::Back => handle.rewind(),
        Key::Skip => handle.skip(),
        Key::Quit => Ok(()),
    }
}

fn render(snapshot: &PlayerSnapshot, last: &mut Option<PlayerSnapshot>) {
    let changed = last.as_ref().is_none_or(|prev| {
        prev.state != snapshot.state
            || prev.current != snapshot.current
            || prev.progress.cursor != snapshot.progress.cursor
    });
    if !changed {
        return;
    }

    let progress = &snapshot.progress;
    let percent = (progress.fraction * 100.0).round();
    match (snapshot.state, &snapshot.current) {
        (PlayerState::Playing, Some(name)) => {
            println!("[{}/{}] {name} ({percent}%)", progress.cursor + 1, progress.total);
        }
        (PlayerState::Paused, _) => println!("paused at {}/{}", progress.cursor + 1, progress.total),
        (PlayerState::Finished, _) => println!("session complete ({} techniques)", progress.total),
        _ => {}
    }
    *last = Some(snapshot.clone());
}

/// Run one session to completion or until the user quits.
///
/// Returns `true` if the session finished.
pub async fn run(run: PracticeRun) -> Result<bool, Box<dyn std::error::Error>> {
    let (handle, driver) = spawn_player(PlayerConfig {
        items: run.items,
        delay: run.delay,
        clock: run.clock,
        engine: run.engine,
        flags: run.flags,
        recorder: run.recorder,
    });

    println!("keys: p pause, r resume, b back, s skip, q quit (then Enter)");
    let mut keys = spawn_keyboard();
    let mut snapshots = handle.subscribe();
    let mut last = None;
    let mut keyboard_open = true;
    handle.start()?;

    let finished = loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break false;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                render(&snapshot, &mut last);
                if snapshot.state == PlayerState::Finished {
                    break true;
                }
            }
            line = keys.recv(), if keyboard_open => {
                let Some(line) = line else {
                    // stdin closed; keep playing without controls
                    keyboard_open = false;
                    continue;
                };
                match Key::parse(&line) {
                    Some(Key::Quit) => break false,
                    Some(key) => apply(&handle, key)?,
                    None if line.trim().is_empty() => {}
                    None => eprintln!("unknown key {:?}", line.trim()),
                }
            }
        }
    };

    drop(snapshots);
    drop(handle);
    driver.await?;
    Ok(finished)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_player_commands() {
        assert_eq!(Key::parse(" p "), Some(Key::Pause));
        assert_eq!(Key::parse("n"), Some(Key::Skip));
        assert_eq!(Key::parse("x"), None);
    }
}
