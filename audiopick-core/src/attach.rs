//! Attaching a chosen source to a card's audio field.

use crate::error::Result;
use crate::format::{attachment_timestamp, build_attachment_filename};
use crate::provider::{AudioSource, Identifier};
use crate::record::{AudioAttachment, RecordId, RecordStore, RecordUpdate};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use tracing::info;

pub struct AttachmentExecutor<'a> {
    store: &'a dyn RecordStore,
    audio_field: String,
    clock: fn() -> DateTime<Local>,
}

impl<'a> AttachmentExecutor<'a> {
    #[must_use]
    pub fn new(store: &'a dyn RecordStore, audio_field: impl Into<String>) -> Self {
        Self {
            store,
            audio_field: audio_field.into(),
            clock: Local::now,
        }
    }

    /// Replace the clock used to timestamp filenames
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the update that clears the audio field and attaches `source` to it.
    #[must_use]
    pub fn build_update(
        &self,
        record_id: RecordId,
        identifier: &Identifier,
        source: &AudioSource,
    ) -> RecordUpdate {
        let timestamp = attachment_timestamp(&(self.clock)());
        let filename = build_attachment_filename(
            &source.url,
            &identifier.word,
            identifier.reading(),
            &timestamp,
        );

        RecordUpdate {
            id: record_id,
            fields: BTreeMap::from([(self.audio_field.clone(), String::new())]),
            audio: vec![AudioAttachment {
                url: source.url.clone(),
                filename,
                fields: vec![self.audio_field.clone()],
            }],
        }
    }

    /// Attach `source` to the card in one update call, returning the stored filename.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UpdateRejected`](crate::CoreError::UpdateRejected)
    /// if the store refuses the update, or any transport error from the store.
    pub fn attach(
        &self,
        record_id: RecordId,
        identifier: &Identifier,
        source: &AudioSource,
    ) -> Result<String> {
        let update = self.build_update(record_id, identifier, source);
        let filename = update
            .audio
            .first()
            .map(|a| a.filename.clone())
            .unwrap_or_default();

        info!("Attaching {} to card {record_id} as {filename}", source.url);
        self.store.update_record_fields(&update)?;
        Ok(filename)
    }
}
