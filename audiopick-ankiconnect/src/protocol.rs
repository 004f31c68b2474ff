//! AnkiConnect request/response envelope and result shapes.

use crate::error::{AnkiConnectError, Result};
use audiopick_core::{Record, RecordId, ViewId, ViewedRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const FIND_NOTES: &str = "findNotes";
pub const NOTES_INFO: &str = "notesInfo";
pub const GUI_CURRENT_CARD: &str = "guiCurrentCard";
pub const CARDS_TO_NOTES: &str = "cardsToNotes";
pub const UPDATE_NOTE_FIELDS: &str = "updateNoteFields";

/// Request body: `{"action": ..., "params": ..., "version": ...}`
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub action: &'a str,
    pub params: Value,
    pub version: u32,
}

/// Unwrap a response envelope into its `result`.
///
/// The envelope must have exactly the fields `result` and `error`.
///
/// # Errors
///
/// Returns [`AnkiConnectError::Protocol`] for a malformed envelope and
/// [`AnkiConnectError::Store`] when `error` is not null.
pub fn unwrap_response(response: Value) -> Result<Value> {
    let Value::Object(mut fields) = response else {
        return Err(AnkiConnectError::Protocol {
            reason: "response is not a JSON object".to_string(),
        });
    };
    if fields.len() != 2 {
        return Err(AnkiConnectError::Protocol {
            reason: "response has an unexpected number of fields".to_string(),
        });
    }
    let Some(error) = fields.remove("error") else {
        return Err(AnkiConnectError::Protocol {
            reason: "response is missing required error field".to_string(),
        });
    };
    let Some(result) = fields.remove("result") else {
        return Err(AnkiConnectError::Protocol {
            reason: "response is missing required result field".to_string(),
        });
    };

    match error {
        Value::Null => Ok(result),
        Value::String(message) => Err(AnkiConnectError::Store { message }),
        other => Err(AnkiConnectError::Store {
            message: other.to_string(),
        }),
    }
}

/// `{"value": ..., "order": ...}` entry of a note's field map
#[derive(Debug, Deserialize)]
struct FieldValue {
    value: String,
}

fn flatten_fields(fields: HashMap<String, FieldValue>) -> HashMap<String, String> {
    fields
        .into_iter()
        .map(|(name, field)| (name, field.value))
        .collect()
}

/// One entry of a `notesInfo` result. Other keys (tags, modelName, ...) are ignored.
#[derive(Debug, Deserialize)]
pub struct NoteInfo {
    #[serde(rename = "noteId")]
    note_id: i64,
    fields: HashMap<String, FieldValue>,
}

impl From<NoteInfo> for Record {
    fn from(info: NoteInfo) -> Self {
        Self {
            id: RecordId(info.note_id),
            fields: flatten_fields(info.fields),
        }
    }
}

/// `guiCurrentCard` result. Other keys (question, buttons, ...) are ignored.
#[derive(Debug, Deserialize)]
pub struct CurrentCard {
    #[serde(rename = "cardId")]
    card_id: i64,
    fields: HashMap<String, FieldValue>,
}

impl From<CurrentCard> for ViewedRecord {
    fn from(card: CurrentCard) -> Self {
        Self {
            view_id: ViewId(card.card_id),
            fields: flatten_fields(card.fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = Request {
            action: FIND_NOTES,
            params: json!({ "query": "\"Word:木\"" }),
            version: 6,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "action": "findNotes", "params": { "query": "\"Word:木\"" }, "version": 6 })
        );
    }

    #[test]
    fn test_unwrap_success() {
        let result = unwrap_response(json!({ "result": [1, 2], "error": null })).unwrap();
        assert_eq!(result, json!([1, 2]));
    }

    #[test]
    fn test_unwrap_null_result_is_success() {
        let result = unwrap_response(json!({ "result": null, "error": null })).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn test_unwrap_store_error() {
        let err =
            unwrap_response(json!({ "result": null, "error": "deck was not found" })).unwrap_err();
        assert!(matches!(
            err,
            AnkiConnectError::Store { ref message } if message == "deck was not found"
        ));
    }

    #[test]
    fn test_unwrap_rejects_bad_envelopes() {
        for response in [
            json!([1, 2]),
            json!({ "result": 1 }),
            json!({ "result": 1, "error": null, "extra": 0 }),
            json!({ "result": 1, "errors": null }),
            json!({ "results": 1, "error": null }),
        ] {
            assert!(
                matches!(unwrap_response(response.clone()), Err(AnkiConnectError::Protocol { .. })),
                "response: {response}"
            );
        }
    }

    #[test]
    fn test_note_info_into_record() {
        let info: NoteInfo = serde_json::from_value(json!({
            "noteId": 1_502_298_033_753_i64,
            "modelName": "JP Mining Note",
            "tags": ["n5"],
            "fields": {
                "Word": { "value": "木", "order": 0 },
                "WordReading": { "value": "木[き]", "order": 1 }
            },
            "cards": [1_502_298_033_754_i64]
        }))
        .unwrap();

        let record = Record::from(info);
        assert_eq!(record.id, RecordId(1_502_298_033_753));
        assert_eq!(record.field("Word"), Some("木"));
        assert_eq!(record.field("WordReading"), Some("木[き]"));
    }

    #[test]
    fn test_current_card_into_viewed_record() {
        let card: CurrentCard = serde_json::from_value(json!({
            "answer": "back",
            "question": "front",
            "deckName": "Mining",
            "modelName": "JP Mining Note",
            "fieldOrder": 0,
            "fields": { "Word": { "value": "橋", "order": 0 } },
            "template": "Card 1",
            "cardId": 1_498_938_915_662_i64,
            "buttons": [1, 2, 3],
            "nextReviews": ["<1m", "<10m", "4d"]
        }))
        .unwrap();

        let viewed = ViewedRecord::from(card);
        assert_eq!(viewed.view_id, ViewId(1_498_938_915_662));
        assert_eq!(viewed.fields.get("Word").map(String::as_str), Some("橋"));
    }
}
