//! Configuration management for threadsift
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::parser::NoiseRuleConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Parser configuration
    #[serde(default)]
    pub parser: ParserConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Parser-specific configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Number of leading lines searched for the account handle
    pub handle_scan_window: usize,

    /// Minimum handle length
    pub handle_min_len: usize,

    /// Maximum handle length
    pub handle_max_len: usize,

    /// Offset of the feed's local time zone (JST by default)
    pub utc_offset_hours: i32,

    /// Characters of the ISO timestamp hashed into a pseudo id
    pub id_timestamp_prefix: usize,

    /// Characters of the body hashed into a pseudo id
    pub id_text_prefix: usize,

    /// Replaces the built-in noise rules when set
    pub noise_rules: Option<Vec<NoiseRuleConfig>>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            handle_scan_window: 15,
            handle_min_len: 5,
            handle_max_len: 30,
            utc_offset_hours: 9,
            id_timestamp_prefix: 16,
            id_text_prefix: 30,
            noise_rules: None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/threadsift.db"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("THREADSIFT_SQLITE_PATH") {
            config.storage.sqlite_path = PathBuf::from(path);
        }

        if let Some(offset) = std::env::var("THREADSIFT_UTC_OFFSET")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
        {
            config.parser.utc_offset_hours = offset;
        }

        if let Some(window) = std::env::var("THREADSIFT_HANDLE_WINDOW")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.parser.handle_scan_window = window;
        }

        if let Ok(level) = std::env::var("THREADSIFT_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("THREADSIFT_LOG_FORMAT") {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::with_source(format!("Failed to read config file: {}", path.display()), e)
        })?;

        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let parser = &self.parser;

        if parser.handle_scan_window == 0 {
            return Err(Error::config("handle_scan_window must be greater than 0"));
        }

        if parser.handle_min_len == 0 || parser.handle_min_len > parser.handle_max_len {
            return Err(Error::config(
                "handle_min_len must be positive and not exceed handle_max_len",
            ));
        }

        if !(-14..=14).contains(&parser.utc_offset_hours) {
            return Err(Error::config("utc_offset_hours must be within -14..=14"));
        }

        if parser.id_timestamp_prefix == 0 || parser.id_text_prefix == 0 {
            return Err(Error::config("pseudo id prefixes must be greater than 0"));
        }

        if !matches!(
            self.logging.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(Error::config(format!(
                "unknown log level '{}', expected trace, debug, info, warn or error",
                self.logging.level
            )));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(Error::config(format!(
                "unknown log format '{}', expected text or json",
                self.logging.format
            )));
        }

        Ok(())
    }
}
