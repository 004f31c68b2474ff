//! Card store records and the trait the store client implements.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Opaque handle of a record (an Anki note id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Handle of the item currently on screen (an Anki card id), owned by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub i64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A record with its field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub fields: HashMap<String, String>,
}

impl Record {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// The item currently shown in the store's reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewedRecord {
    pub view_id: ViewId,
    pub fields: HashMap<String, String>,
}

/// One audio file the store should download and attach to the given fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioAttachment {
    pub url: String,
    pub filename: String,
    pub fields: Vec<String>,
}

/// Field update for a single record: new field values plus audio to attach.
///
/// Serializes to the `note` parameter of AnkiConnect's `updateNoteFields`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordUpdate {
    pub id: RecordId,
    pub fields: BTreeMap<String, String>,
    pub audio: Vec<AudioAttachment>,
}

/// Trait for card stores
///
/// Every call blocks until the store answers. Errors reported by the store
/// itself surface as [`CoreError::RecordStore`](crate::CoreError::RecordStore),
/// except for [`RecordStore::update_record_fields`], which reports them as
/// [`CoreError::UpdateRejected`](crate::CoreError::UpdateRejected).
pub trait RecordStore {
    /// Find the ids of every record matching a search query.
    fn find_records(&self, query: &str) -> Result<Vec<RecordId>>;

    /// Fetch the fields of the given records, in the same order.
    fn records_info(&self, ids: &[RecordId]) -> Result<Vec<Record>>;

    /// Fetch the item currently in view.
    fn current_view(&self) -> Result<ViewedRecord>;

    /// Map viewed items to the records that own them.
    fn view_to_record(&self, views: &[ViewId]) -> Result<Vec<RecordId>>;

    /// Apply a field update as a single call.
    fn update_record_fields(&self, update: &RecordUpdate) -> Result<()>;
}
