//! Path constants for configuration, log and scratch files.

use std::path::PathBuf;

/// The name of the configuration directory under ~/.config/
pub const CONFIG_DIR_NAME: &str = "audiopick";

/// The name of the main configuration file
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// The name of the log file (written only when file logging is enabled)
pub const LOG_FILE_NAME: &str = "audiopick.log";

/// The name of the scratch file the player reads from
pub const SCRATCH_FILE_NAME: &str = "local_audio";

/// Get the configuration directory path (~/.config/audiopick/)
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join(CONFIG_DIR_NAME)
}

/// Get the config file path (~/.config/audiopick/config.toml)
#[must_use]
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Get the log file path (`<cache dir>/audiopick/audiopick.log`)
#[must_use]
pub fn log_file_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CONFIG_DIR_NAME)
        .join(LOG_FILE_NAME)
}

/// Default scratch file for playback (`<temp dir>/local_audio`)
#[must_use]
pub fn default_scratch_path() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_FILE_NAME)
}
