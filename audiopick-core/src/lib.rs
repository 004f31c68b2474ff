pub mod attach;
pub mod config;
pub mod error;
pub mod format;
pub mod paths;
pub mod playback;
pub mod provider;
pub mod record;
pub mod resolver;
pub mod session;
pub mod workflow;

pub use attach::AttachmentExecutor;
pub use config::{
    AppConfig, AudioServerConfig, LoggingConfig, MalformedCommandPolicy, PlayerConfig,
    RecordStoreConfig, SessionConfig, CONFIG_TEMPLATE,
};

pub use error::CoreError;
pub use format::{build_attachment_filename, normalize_reading};
pub use paths::{
    config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME,
};
pub use playback::{AudioPlayer, ExternalPlayer, PlaybackExecutor};
pub use provider::{AudioSource, AudioSourceProvider, Identifier};
pub use record::{
    AudioAttachment, Record, RecordId, RecordStore, RecordUpdate, ViewId, ViewedRecord,
};
pub use resolver::{RecordResolver, Resolution, ResolveMode};
pub use session::{Command, Executors, Session, SessionOutcome, SessionState};
pub use workflow::Workflow;
