//! Error types for the threadsift parser
//!
//! These errors never escape a parse session: time-token failures collapse to
//! "now" at the resolver, and rule errors surface when a session is built.

use thiserror::Error;

/// Errors that can occur while turning a time token into an instant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// Token matches none of the recognized grammars
    #[error("Unrecognized time token: {0}")]
    Unrecognized(String),

    /// Numeric part could not be parsed
    #[error("Invalid number in time token '{token}': {reason}")]
    InvalidNumber { token: String, reason: String },

    /// Calendar date or offset does not exist
    #[error("Time token out of range: {0}")]
    OutOfRange(String),
}

/// Errors that can occur while compiling noise rules
#[derive(Error, Debug)]
pub enum RuleError {
    /// Regex pattern failed to compile
    #[error("Invalid regex for {kind} rule '{pattern}': {source}")]
    InvalidRegex {
        kind: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Rule kind needs a pattern but none was given
    #[error("{kind} rule requires a non-empty pattern")]
    EmptyPattern { kind: String },
}

/// Errors that can occur while decoding raw input bytes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Neither UTF-8 nor the fallback encoding decoded cleanly
    #[error("Input is neither valid UTF-8 nor {encoding}")]
    UnknownEncoding { encoding: &'static str },
}
