//! Unified error handling for the threadsift crate
//!
//! The parser itself has no fatal path: unparseable input yields an empty
//! outcome. Errors here cover everything around it (rule compilation,
//! configuration, input decoding and the SQLite store).
//!
//! # Architecture
//!
//! - [`SiftErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

pub use crate::utils::error::{DecodeError, RuleError, TimeParseError};

/// Common trait for all threadsift error types
pub trait SiftErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Input decoding, time tokens and noise rules
    Parsing,
    /// SQLite errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Filesystem errors
    Io,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Io => "io",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the threadsift crate
#[derive(Error, Debug)]
pub enum Error {
    /// Noise rule compilation errors
    #[error("Rule error: {0}")]
    Rule(#[from] RuleError),

    /// Input decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Database errors
    #[error("Database error: {0}")]
    Storage(#[source] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SiftErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Rule(_) | Self::Decode(_) => false,
            Self::Storage(e) => matches!(
                e.sqlite_error_code(),
                Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
            ),
            Self::Io(_) => true, // I/O errors are often transient
            Self::Json(_) | Self::Toml(_) | Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Rule(_) | Self::Decode(_) | Self::Json(_) => ErrorCategory::Parsing,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Io(_) => ErrorCategory::Io,
            Self::Toml(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Conversion from rusqlite::Error
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err)
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
