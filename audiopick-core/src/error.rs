use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    // Resolution errors
    #[error("Multiple cards found: {}", matches.join(", "))]
    AmbiguousMatch { matches: Vec<String> },

    #[error("No cards found for query: {query}")]
    NoMatch { query: String },

    #[error("Card is missing field: {field}")]
    MissingField { field: String },

    // Record store errors
    #[error("Record store action {action} failed: {reason}")]
    RecordStore { action: String, reason: String },

    #[error("Record store rejected the update: {reason}")]
    UpdateRejected { reason: String },

    #[error("No card was resolved for this session, audio can only be played")]
    NoResolvedRecord,

    // Audio source provider errors
    #[error("Audio server unreachable: {reason}")]
    ProviderUnreachable { reason: String },

    #[error("Audio server returned an unexpected response: {reason}")]
    ProviderBadResponse { reason: String },

    // Selection errors
    #[error("Invalid index: {index} (have {len} sources)")]
    InvalidIndex { index: usize, len: usize },

    #[error("Unrecognized command: {input:?}")]
    MalformedCommand { input: String },

    // Playback errors
    #[error("Failed to fetch audio from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to run player `{command}`: {reason}")]
    PlayerInvocation { command: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CoreError {
    /// Whether the selection loop can keep going after reporting this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidIndex { .. }
                | Self::Fetch { .. }
                | Self::PlayerInvocation { .. }
                | Self::NoResolvedRecord
                | Self::IoError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_match_lists_every_key() {
        let err = CoreError::AmbiguousMatch {
            matches: vec!["橋".into(), "箸".into()],
        };
        assert_eq!(err.to_string(), "Multiple cards found: 橋, 箸");
    }

    #[test]
    fn test_loop_errors_are_recoverable() {
        assert!(CoreError::InvalidIndex { index: 5, len: 3 }.is_recoverable());
        assert!(CoreError::NoResolvedRecord.is_recoverable());
        assert!(!CoreError::MalformedCommand { input: "x".into() }.is_recoverable());
        assert!(!CoreError::UpdateRejected { reason: "x".into() }.is_recoverable());
    }
}
