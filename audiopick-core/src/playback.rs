//! Previewing a source: download it to the scratch file and hand it to a player.

use crate::error::{CoreError, Result};
use crate::provider::{AudioSource, AudioSourceProvider};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Something that can play a local audio file, blocking until it finishes.
pub trait AudioPlayer {
    fn play_file(&self, path: &Path) -> Result<()>;
}

/// Player run as a child process with the file path appended to its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPlayer {
    program: String,
    args: Vec<String>,
}

impl ExternalPlayer {
    /// Build a player from a shell-style command line such as `mpv --no-video`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] if the command is empty or has
    /// unbalanced quotes.
    pub fn from_command(command: &str) -> Result<Self> {
        let parts = shell_words::split(command.trim()).map_err(|e| CoreError::ConfigInvalid {
            message: format!("player.command {command:?}: {e}"),
        })?;
        let Some((program, args)) = parts.split_first() else {
            return Err(CoreError::ConfigMissingField {
                field: "player.command".to_string(),
            });
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl AudioPlayer for ExternalPlayer {
    fn play_file(&self, path: &Path) -> Result<()> {
        debug!("Running {} {}", self.command_line(), path.display());
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|e| CoreError::PlayerInvocation {
                command: self.command_line(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "unknown".to_string(), |c| c.to_string());
            warn!("Player {} exited with code {code}", self.program);
        }
        Ok(())
    }
}

/// Plays a source by downloading it over the scratch file and running the player.
pub struct PlaybackExecutor<'a> {
    provider: &'a dyn AudioSourceProvider,
    player: &'a dyn AudioPlayer,
    scratch_path: PathBuf,
}

impl<'a> PlaybackExecutor<'a> {
    #[must_use]
    pub fn new(
        provider: &'a dyn AudioSourceProvider,
        player: &'a dyn AudioPlayer,
        scratch_path: PathBuf,
    ) -> Self {
        Self {
            provider,
            player,
            scratch_path,
        }
    }

    #[must_use]
    pub fn scratch_path(&self) -> &Path {
        &self.scratch_path
    }

    /// Fetch and play a source, returning once the player exits.
    ///
    /// The scratch file is overwritten on every call.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Fetch`] if the audio cannot be downloaded,
    /// [`CoreError::IoError`] if the scratch file cannot be written and
    /// [`CoreError::PlayerInvocation`] if the player cannot be started.
    pub fn play(&self, source: &AudioSource) -> Result<()> {
        let bytes = self.provider.fetch_audio(&source.url)?;
        info!(
            "Playing {} ({} bytes) from {}",
            source.name,
            bytes.len(),
            self.scratch_path.display()
        );
        fs::write(&self.scratch_path, &bytes)?;
        self.player.play_file(&self.scratch_path)
    }
}
