use crate::error::{CoreError, Result};
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DEFAULT_RECORD_STORE_URL: &str = "http://localhost:8765";
const DEFAULT_API_VERSION: u32 = 6;
const DEFAULT_NOTE_TYPE: &str = "JP Mining Note";
const DEFAULT_WORD_FIELD: &str = "Word";
const DEFAULT_READING_FIELD: &str = "WordReading";
const DEFAULT_KEY_FIELD: &str = "Key";
const DEFAULT_AUDIO_FIELD: &str = "WordAudio";
const DEFAULT_AUDIO_SERVER_URL: &str = "http://localhost:5050";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PLAYER_COMMAND: &str = "mpv";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub record_store: RecordStoreConfig,
    #[serde(default)]
    pub audio_server: AudioServerConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection and field mapping for the AnkiConnect-compatible card store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStoreConfig {
    #[serde(default = "default_record_store_url")]
    pub url: String,
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Note type every card query is restricted to
    #[serde(default = "default_note_type")]
    pub note_type: String,
    #[serde(default = "default_word_field")]
    pub word_field: String,
    #[serde(default = "default_reading_field")]
    pub reading_field: String,
    /// Field searched with `--key` and listed when a query is ambiguous
    #[serde(default = "default_key_field")]
    pub key_field: String,
    /// Field the chosen audio is attached to
    #[serde(default = "default_audio_field")]
    pub audio_field: String,
}

fn default_record_store_url() -> String {
    DEFAULT_RECORD_STORE_URL.to_string()
}

const fn default_api_version() -> u32 {
    DEFAULT_API_VERSION
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_note_type() -> String {
    DEFAULT_NOTE_TYPE.to_string()
}

fn default_word_field() -> String {
    DEFAULT_WORD_FIELD.to_string()
}

fn default_reading_field() -> String {
    DEFAULT_READING_FIELD.to_string()
}

fn default_key_field() -> String {
    DEFAULT_KEY_FIELD.to_string()
}

fn default_audio_field() -> String {
    DEFAULT_AUDIO_FIELD.to_string()
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            url: default_record_store_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            note_type: default_note_type(),
            word_field: default_word_field(),
            reading_field: default_reading_field(),
            key_field: default_key_field(),
            audio_field: default_audio_field(),
        }
    }
}

impl RecordStoreConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioServerConfig {
    #[serde(default = "default_audio_server_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_audio_server_url() -> String {
    DEFAULT_AUDIO_SERVER_URL.to_string()
}

impl Default for AudioServerConfig {
    fn default() -> Self {
        Self {
            url: default_audio_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AudioServerConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Player command line; the scratch file path is appended as the last argument
    #[serde(default = "default_player_command")]
    pub command: String,
    /// Scratch file overwritten on every playback (defaults to `<temp dir>/local_audio`)
    #[serde(default)]
    pub scratch_file: Option<PathBuf>,
}

fn default_player_command() -> String {
    DEFAULT_PLAYER_COMMAND.to_string()
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: default_player_command(),
            scratch_file: None,
        }
    }
}

impl PlayerConfig {
    #[must_use]
    pub fn scratch_path(&self) -> PathBuf {
        self.scratch_file
            .clone()
            .unwrap_or_else(crate::paths::default_scratch_path)
    }
}

/// What the selection loop does with input it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MalformedCommandPolicy {
    /// Report the bad command and prompt again
    #[default]
    Report,
    /// End the session with an error
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub on_malformed_command: MalformedCommandPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `<cache dir>/audiopick/audiopick.log`
    #[serde(default)]
    pub enabled: bool,
}

impl AppConfig {
    /// Get the configuration directory path (~/.config/audiopick/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/audiopick/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location, writing the template on first run.
    ///
    /// A freshly created template yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written, read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, CONFIG_TEMPLATE)?;
            info!("Created config template at {}", config_path.display());
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load config from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content).map_err(|e| match e {
            CoreError::ConfigParseError { source, .. } => CoreError::ConfigParseError {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate config file contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a field fails validation.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|source| CoreError::ConfigParseError {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate that required fields are present and usable.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("record_store.url", &self.record_store.url),
            ("record_store.note_type", &self.record_store.note_type),
            ("record_store.word_field", &self.record_store.word_field),
            ("record_store.reading_field", &self.record_store.reading_field),
            ("record_store.key_field", &self.record_store.key_field),
            ("record_store.audio_field", &self.record_store.audio_field),
            ("audio_server.url", &self.audio_server.url),
            ("player.command", &self.player.command),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigMissingField {
                    field: field.to_string(),
                });
            }
        }

        if self.record_store.timeout_secs == 0 || self.audio_server.timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "timeout_secs must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Template written on first run. Every value matches the built-in default.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# audiopick configuration
# ~/.config/audiopick/config.toml

[record_store]
# AnkiConnect endpoint (Anki must be running with the add-on installed)
url = ""#,
    DEFAULT_RECORD_STORE_URL,
    r#""
api_version = "#,
    DEFAULT_API_VERSION,
    r#"
timeout_secs = "#,
    DEFAULT_TIMEOUT_SECS,
    r#"
note_type = ""#,
    DEFAULT_NOTE_TYPE,
    r#""
word_field = ""#,
    DEFAULT_WORD_FIELD,
    r#""
reading_field = ""#,
    DEFAULT_READING_FIELD,
    r#""
key_field = ""#,
    DEFAULT_KEY_FIELD,
    r#""
audio_field = ""#,
    DEFAULT_AUDIO_FIELD,
    r#""

[audio_server]
# Local audio server queried with ?term=<word>&reading=<reading>
url = ""#,
    DEFAULT_AUDIO_SERVER_URL,
    r#""
timeout_secs = "#,
    DEFAULT_TIMEOUT_SECS,
    r#"

[player]
# The scratch file path is appended as the last argument
command = ""#,
    DEFAULT_PLAYER_COMMAND,
    r#""
# scratch_file = "/tmp/local_audio"

[session]
# Unrecognized input at the prompt: "report" (prompt again) or "abort"
on_malformed_command = "report"

[logging]
# Also write logs to the cache directory
enabled = false
"#
);
