// Core data structures for the threadsift parser

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Set of already-accepted post ids, owned by the caller
///
/// Seeded from the persistent store before a parse and mutated in place as
/// new records are accepted.
pub type SeenIdSet = HashSet<String>;

/// One line of pasted input with its position in the batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub index: usize,
    pub text: String,
}

impl RawLine {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// Author identifier detected once per import batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountHandle(String);

impl AccountHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a line is exactly this handle
    pub fn matches(&self, line: &str) -> bool {
        self.0 == line
    }
}

impl fmt::Display for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Layout in which a post header was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorLayout {
    /// `handle` directly followed by a time token
    Inline,
    /// `N`, `/`, `M`, `handle`, time token
    ThreadNumbered,
}

/// Detected (account line, timestamp line) pair marking the start of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostAnchor {
    pub account_line_index: usize,
    pub timestamp_line_index: usize,
    pub layout: AnchorLayout,
}

impl PostAnchor {
    /// First line index that belongs to this anchor's header
    pub fn header_start(&self) -> usize {
        match self.layout {
            AnchorLayout::Inline => self.account_line_index,
            AnchorLayout::ThreadNumbered => self.account_line_index.saturating_sub(3),
        }
    }
}

/// Lines between one anchor's timestamp and the next header
#[derive(Debug, Clone)]
pub struct PostBlock<'a> {
    pub anchor: PostAnchor,
    pub timestamp_token: &'a str,
    pub lines: &'a [RawLine],
}

/// Structured post recovered from pasted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPostRecord {
    pub username: String,
    #[serde(with = "iso_seconds")]
    pub posted_at: DateTime<Utc>,
    pub original_text: String,
    pub post_id: String,
    pub source_url: String,
    pub like_count: u64,
    pub retweet_count: u64,
}

impl ParsedPostRecord {
    /// `posted_at` as `YYYY-MM-DDTHH:MM:SSZ`
    pub fn posted_at_iso(&self) -> String {
        format_iso(&self.posted_at)
    }
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

mod iso_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_iso(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Counters describing how a parse session spent its anchors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub anchors: usize,
    pub accepted: usize,
    pub duplicates: usize,
    pub empty: usize,
}

/// Output of one parse session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub records: Vec<ParsedPostRecord>,
    pub new_count: usize,
    pub stats: ParseStats,
}

impl ParseOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
