use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Word and optional reading used to look up audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    /// Word as written (e.g. kanji)
    pub word: String,
    /// Kana reading, if known
    pub reading: Option<String>,
}

impl Identifier {
    /// Create an identifier without a reading
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            reading: None,
        }
    }

    /// Set reading
    #[must_use]
    pub fn with_reading(mut self, reading: impl Into<String>) -> Self {
        self.reading = Some(reading.into());
        self
    }

    /// Set reading if present
    #[must_use]
    pub fn with_optional_reading(mut self, reading: Option<impl Into<String>>) -> Self {
        self.reading = reading.map(Into::into);
        self
    }

    #[must_use]
    pub fn reading(&self) -> Option<&str> {
        self.reading.as_deref()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reading {
            Some(reading) => write!(f, "{} {}", self.word, reading),
            None => f.write_str(&self.word),
        }
    }
}

/// One candidate clip returned by the audio server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSource {
    /// Display name (e.g. "jisho", "nhk16 (1)")
    pub name: String,
    /// Where the audio bytes can be fetched
    pub url: String,
}

impl AudioSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Trait for audio source providers
///
/// Calls block until the provider answers. No retries are attempted.
pub trait AudioSourceProvider {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Look up candidate sources, in the order the provider ranks them.
    ///
    /// The order is significant and must not be changed by callers.
    fn fetch_sources(&self, identifier: &Identifier) -> Result<Vec<AudioSource>>;

    /// Fetch the raw audio bytes of a source URL.
    fn fetch_audio(&self, url: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display() {
        assert_eq!(Identifier::new("木").to_string(), "木");
        assert_eq!(Identifier::new("木").with_reading("き").to_string(), "木 き");
    }

    #[test]
    fn test_optional_reading() {
        let id = Identifier::new("木").with_optional_reading(None::<String>);
        assert_eq!(id.reading(), None);
        let id = Identifier::new("木").with_optional_reading(Some("き"));
        assert_eq!(id.reading(), Some("き"));
    }
}
