use crate::error::{AnkiConnectError, Result};
use crate::protocol::{
    unwrap_response, CurrentCard, NoteInfo, Request, CARDS_TO_NOTES, FIND_NOTES,
    GUI_CURRENT_CARD, NOTES_INFO, UPDATE_NOTE_FIELDS,
};
use audiopick_core::{
    CoreError, Record, RecordId, RecordStore, RecordStoreConfig, RecordUpdate, ViewId,
    ViewedRecord,
};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Connect timeout, kept short since AnkiConnect runs on the local machine
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Blocking AnkiConnect client
pub struct AnkiConnectClient {
    client: Client,
    url: String,
    version: u32,
}

impl AnkiConnectClient {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &RecordStoreConfig) -> std::result::Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout()))
            .build()
            .map_err(|e| CoreError::ConfigInvalid {
                message: format!("cannot create AnkiConnect client: {e}"),
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            version: config.api_version,
        })
    }

    /// Send one action and return its raw `result`.
    fn call(&self, action: &str, params: Value) -> Result<Value> {
        let request = Request {
            action,
            params,
            version: self.version,
        };
        debug!("AnkiConnect {action} -> {}", self.url);

        let response = self.client.post(&self.url).json(&request).send()?;
        if !response.status().is_success() {
            warn!("AnkiConnect returned status: {}", response.status());
            return Err(AnkiConnectError::Protocol {
                reason: format!("HTTP status {}", response.status()),
            });
        }

        unwrap_response(response.json()?)
    }

    fn invoke<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> std::result::Result<T, CoreError> {
        self.call(action, params)
            .and_then(|result| Ok(serde_json::from_value(result)?))
            .map_err(|e| e.into_core(action))
    }
}

impl RecordStore for AnkiConnectClient {
    fn find_records(&self, query: &str) -> std::result::Result<Vec<RecordId>, CoreError> {
        let ids: Vec<i64> = self.invoke(FIND_NOTES, json!({ "query": query }))?;
        debug!("findNotes matched {} note(s)", ids.len());
        Ok(ids.into_iter().map(RecordId).collect())
    }

    fn records_info(&self, ids: &[RecordId]) -> std::result::Result<Vec<Record>, CoreError> {
        let infos: Vec<NoteInfo> = self.invoke(NOTES_INFO, json!({ "notes": ids }))?;
        Ok(infos.into_iter().map(Record::from).collect())
    }

    fn current_view(&self) -> std::result::Result<ViewedRecord, CoreError> {
        // null when the reviewer is not showing a card
        let card: Option<CurrentCard> = self.invoke(GUI_CURRENT_CARD, json!({}))?;
        card.map(ViewedRecord::from)
            .ok_or_else(|| CoreError::RecordStore {
                action: GUI_CURRENT_CARD.to_string(),
                reason: "no card is currently being reviewed".to_string(),
            })
    }

    fn view_to_record(&self, views: &[ViewId]) -> std::result::Result<Vec<RecordId>, CoreError> {
        let ids: Vec<i64> = self.invoke(CARDS_TO_NOTES, json!({ "cards": views }))?;
        Ok(ids.into_iter().map(RecordId).collect())
    }

    fn update_record_fields(&self, update: &RecordUpdate) -> std::result::Result<(), CoreError> {
        let _: Value = self.invoke(UPDATE_NOTE_FIELDS, json!({ "note": update }))?;
        Ok(())
    }
}
