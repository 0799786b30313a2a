//! threadsift - structured posts from pasted social feed text
//!
//! Turns the plain text a user copies out of a social feed profile page into
//! deduplicated post records: author handle, absolute UTC timestamp, cleaned
//! body, like and reply counts, and a deterministic pseudo id.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`parser`] - Segmentation, noise removal, time resolution and record assembly
//! - [`models`] - Core data structures and types
//! - [`config`] - Configuration management and settings
//! - [`storage`] - SQLite persistence of posts and ticker weights
//! - [`analytics`] - Ticker mention counting and per-account weights
//! - [`utils`] - Input decoding and line helpers
//!
//! # Example
//!
//! ```no_run
//! use threadsift::parser::ParseSession;
//! use threadsift::models::SeenIdSet;
//!
//! let text = std::fs::read_to_string("profile.txt").unwrap();
//! let lines = threadsift::utils::split_lines(&text);
//!
//! let mut seen = SeenIdSet::new();
//! let outcome = ParseSession::new().parse(&lines, &mut seen);
//! println!("{} new posts", outcome.new_count);
//! ```

pub mod analytics;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, SiftErrorTrait};
    pub use crate::models::{ParseOutcome, ParseStats, ParsedPostRecord, SeenIdSet};
    pub use crate::parser::{parse_lines, ParseSession};
    pub use crate::storage::{PostRepository, SqlitePostStore};
}

// Direct re-exports for convenience
pub use models::{ParseOutcome, ParsedPostRecord, SeenIdSet};
pub use parser::{parse_lines, ParseSession};
