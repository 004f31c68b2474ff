//! Workflow that resolves a word, looks up its audio and runs the selection loop.

use crate::attach::AttachmentExecutor;
use crate::config::AppConfig;
use crate::error::Result;
use crate::playback::{AudioPlayer, PlaybackExecutor};
use crate::provider::{AudioSourceProvider, Identifier};
use crate::record::RecordStore;
use crate::resolver::{RecordResolver, ResolveMode};
use crate::session::{Executors, Session, SessionOutcome};
use std::io::{BufRead, Write};
use tracing::info;

/// Connects the card store, audio provider and player for one run.
pub struct Workflow<'a> {
    config: &'a AppConfig,
    store: &'a dyn RecordStore,
    provider: &'a dyn AudioSourceProvider,
    player: &'a dyn AudioPlayer,
}

impl<'a> Workflow<'a> {
    #[must_use]
    pub fn new(
        config: &'a AppConfig,
        store: &'a dyn RecordStore,
        provider: &'a dyn AudioSourceProvider,
        player: &'a dyn AudioPlayer,
    ) -> Self {
        Self {
            config,
            store,
            provider,
            player,
        }
    }

    /// Resolve the mode and fetch candidate sources.
    ///
    /// The provider is only contacted once resolution has succeeded.
    ///
    /// # Errors
    ///
    /// Returns any resolution error (ambiguous or missing card, store failure)
    /// or provider error. No session is started in that case.
    pub fn prepare(
        &self,
        mode: &ResolveMode,
        lookup_override: Option<&Identifier>,
    ) -> Result<Session> {
        let resolution = RecordResolver::new(self.store, &self.config.record_store)
            .resolve(mode, lookup_override)?;

        info!(
            "Looking up {} with provider {}",
            resolution.identifier,
            self.provider.name()
        );
        let sources = self.provider.fetch_sources(&resolution.identifier)?;
        info!("Provider returned {} source(s)", sources.len());

        Ok(Session::new(
            resolution,
            sources,
            self.config.session.on_malformed_command,
        ))
    }

    /// Drive a prepared session against the operator's input and output.
    ///
    /// # Errors
    ///
    /// Returns the session's unrecoverable error, if any.
    pub fn run<R: BufRead, W: Write>(
        &self,
        session: Session,
        input: R,
        output: W,
    ) -> Result<SessionOutcome> {
        let executors = Executors {
            playback: PlaybackExecutor::new(
                self.provider,
                self.player,
                self.config.player.scratch_path(),
            ),
            attachment: AttachmentExecutor::new(self.store, &self.config.record_store.audio_field),
        };
        session.run(input, output, &executors)
    }
}
