use async_trait::async_trait;
use tokio::process::Command;

use crate::error::NarrationError;

/// Asynchronous text-to-speech backend.
///
/// The returned future resolves when the utterance has finished playing.
/// Dropping it must stop the utterance.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), NarrationError>;
}

/// Speaks by running an external program with the text as its last argument,
/// e.g. `say` or `espeak-ng`.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a shell-like command line on whitespace. Returns `None` when blank.
    #[must_use]
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl SpeechEngine for CommandSpeech {
    async fn speak(&self, text: &str) -> Result<(), NarrationError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(NarrationError::ExitStatus(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_program_and_arguments() {
        let engine = CommandSpeech::parse("  espeak-ng -s 140 ").unwrap();
        assert_eq!(engine.program(), "espeak-ng");
        assert_eq!(engine.args, vec!["-s", "140"]);
        assert!(CommandSpeech::parse("   ").is_none());
    }
}
