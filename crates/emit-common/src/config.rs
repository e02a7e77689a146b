//! Configuration structures for tickers.
//!
//! Supports TOML deserialization with defaults that produce a plain
//! ticker: no tick dropping on reset or stop, and an output channel
//! that stays open after stop.

use crate::error::{EmitError, EmitResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Construction-time switches of a ticker.
///
/// These are fixed for the lifetime of the ticker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerConfig {
    /// Close the output channel on stop, so consumers iterating over it
    /// finish instead of blocking forever.
    pub close_on_stop: bool,

    /// Discard an unconsumed tick when the period is reset.
    pub drop_tick_on_reset: bool,

    /// Discard an unconsumed tick when the ticker is stopped.
    pub drop_tick_on_stop: bool,
}

/// Top-level configuration for a ticker driven from a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitConfig {
    /// Initial tick period. Zero starts the ticker paused.
    #[serde(with = "humantime_serde")]
    pub period: Duration,

    /// Ticker behaviour switches.
    pub ticker: TickerConfig,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(1),
            ticker: TickerConfig::default(),
        }
    }
}

impl EmitConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!(?path, "Loading ticker configuration");
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }
}

/// Parse a human-readable period such as `"250ms"` or `"1m 30s"`.
///
/// `"0s"` is accepted and means "paused". Negative input is rejected.
///
/// # Errors
///
/// Returns [`EmitError::Config`] if the text is not a valid duration.
pub fn parse_period(text: &str) -> EmitResult<Duration> {
    humantime::parse_duration(text.trim())
        .map_err(|e| EmitError::Config(format!("invalid period {text:?}: {e}")))
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl From<ConfigError> for EmitError {
    fn from(err: ConfigError) -> Self {
        EmitError::Config(err.to_string())
    }
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
