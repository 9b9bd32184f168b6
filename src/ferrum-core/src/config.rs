//! `config.toml` in the Ferrum config directory.
//!
//! ```toml
//! [playback]
//! shuffle = true
//! repeat = false
//!
//! [logging]
//! level = "debug"
//! max_log_files = 7
//! ```
//!
//! Every key is optional; a missing file means all defaults.

use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "config.toml";
const CONFIG_VERSION: u32 = 1;
const DEFAULT_MAX_LOG_FILES: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub config_version: u32,
    pub playback: PlaybackConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            playback: PlaybackConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Shuffle and repeat as they stand when the player starts. Both off unless
/// the user turned them on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub shuffle: bool,
    pub repeat: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Daily log files kept in the log directory, newest first.
    pub max_log_files: usize,
    /// Mirror log lines to stdout as well as the file.
    pub stdout: bool,
    /// Overrides the `ferrum.log` file name prefix.
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            max_log_files: DEFAULT_MAX_LOG_FILES,
            stdout: true,
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("rejected config: {0}")]
    Validation(ValidationError),
    #[error("config directory unavailable: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("config_version {found} is not supported (this build reads {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("logging.max_log_files must be at least 1")]
    NoLogFiles,
}

impl Config {
    /// Read `config.toml` from `dirs`, creating the directories first. A
    /// missing file is not an error.
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        let path = Self::config_path(dirs);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        tracing::debug!(
            path = %path.display(),
            shuffle = config.playback.shuffle,
            repeat = config.playback.repeat,
            "loaded config"
        );
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join(CONFIG_FILE)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Config { config_version, .. } if *config_version != CONFIG_VERSION => {
                Err(ValidationError::UnsupportedVersion {
                    found: *config_version,
                    expected: CONFIG_VERSION,
                })
            }
            Config { logging, .. } if logging.max_log_files == 0 => {
                Err(ValidationError::NoLogFiles)
            }
            _ => Ok(()),
        }
    }
}
