use audiopick_core::CoreError;
use thiserror::Error;

/// Failure of a single AnkiConnect call.
#[derive(Debug, Error)]
pub enum AnkiConnectError {
    /// Request could not be sent or the response body could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response did not have the `{result, error}` envelope.
    #[error("unexpected response: {reason}")]
    Protocol { reason: String },

    /// `result` did not have the shape the action returns.
    #[error("unexpected result: {0}")]
    Json(#[from] serde_json::Error),

    /// AnkiConnect answered with a non-null `error`.
    #[error("{message}")]
    Store { message: String },
}

impl AnkiConnectError {
    /// Convert into the core error for the given action.
    ///
    /// Errors reported by Anki itself while updating a note become
    /// [`CoreError::UpdateRejected`]; everything else is a store failure.
    #[must_use]
    pub fn into_core(self, action: &str) -> CoreError {
        match self {
            Self::Store { message } if action == crate::protocol::UPDATE_NOTE_FIELDS => {
                CoreError::UpdateRejected { reason: message }
            }
            other => CoreError::RecordStore {
                action: action.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Convenience type alias for Results with `AnkiConnectError`.
pub type Result<T> = std::result::Result<T, AnkiConnectError>;
