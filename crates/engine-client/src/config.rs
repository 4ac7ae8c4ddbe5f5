//! Configuration file loading.
//!
//! Settings live in a TOML file (`chess-assist.toml` by default). Every
//! field has a default, so a missing or empty file is a valid configuration.

use crate::advisor::Mode;
use crate::request::SearchLimit;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// How to launch the engine process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Program to run, optionally followed by arguments.
    /// Defaults to "stockfish" (assumes it's in PATH).
    #[serde(default = "default_command")]
    pub command: String,
    /// Extra arguments appended after those in `command`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Pause after launch before sending `uci`.
    #[serde(default = "default_handshake_delay_ms")]
    pub handshake_delay_ms: u64,
}

fn default_command() -> String {
    "stockfish".to_string()
}

fn default_handshake_delay_ms() -> u64 {
    500
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            handshake_delay_ms: default_handshake_delay_ms(),
        }
    }
}

impl EngineSettings {
    pub fn handshake_delay(&self) -> Duration {
        Duration::from_millis(self.handshake_delay_ms)
    }
}

/// What to analyse and how.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisSettings {
    /// Which side is being assisted.
    #[serde(default)]
    pub mode: Mode,
    /// Search limit for best-move requests.
    #[serde(default)]
    pub limit: SearchLimit,
    /// Ask for a static evaluation when the search reports no score.
    #[serde(default = "default_eval_fallback")]
    pub eval_fallback: bool,
    /// Caller-side timeout per request in milliseconds; 0 disables it.
    #[serde(default)]
    pub timeout_ms: u64,
}

fn default_eval_fallback() -> bool {
    true
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            limit: SearchLimit::default(),
            eval_fallback: default_eval_fallback(),
            timeout_ms: 0,
        }
    }
}

impl AnalysisSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct AssistConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

impl AssistConfig {
    /// Loads the configuration from [`Self::config_path()`], falling back to
    /// defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// or [`ConfigError::ParseError`] if the file contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads the configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Returns the default configuration file path.
    pub fn config_path() -> PathBuf {
        PathBuf::from("chess-assist.toml")
    }
}
