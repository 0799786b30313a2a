//! Deterministic pseudo ids for posts scraped without a platform id
//!
//! The id is the first 10 hex digits of an MD5 digest over
//! `{username}-{ts16}-{snippet30}`, where `ts16` is the ISO timestamp cut to
//! the minute and `snippet30` the first 30 characters of the body. Cutting the
//! seconds keeps the id stable when a relative token is re-resolved a few
//! seconds apart.
//!
//! 10 hex digits are 40 bits. Collisions are unlikely at a few thousand posts
//! per account but not impossible; a colliding post is dropped as a duplicate.

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};

use crate::models::format_iso;
use crate::utils::char_prefix;

/// Body prefix used when the text is empty
const EMPTY_TEXT_TOKEN: &str = "empty";

/// Hex digits kept from the digest
pub const PSEUDO_ID_LEN: usize = 10;

/// Derives stable short ids from (author, timestamp, text prefix)
#[derive(Debug, Clone, Copy)]
pub struct PseudoIdGenerator {
    timestamp_prefix: usize,
    text_prefix: usize,
}

impl PseudoIdGenerator {
    pub fn new(timestamp_prefix: usize, text_prefix: usize) -> Self {
        Self {
            timestamp_prefix,
            text_prefix,
        }
    }

    /// Generate an id from an ISO-8601 timestamp string
    pub fn generate(&self, username: &str, iso_timestamp: &str, text: &str) -> String {
        let ts = char_prefix(iso_timestamp, self.timestamp_prefix);
        let snippet = if text.is_empty() {
            EMPTY_TEXT_TOKEN
        } else {
            char_prefix(text, self.text_prefix)
        };

        let mut hasher = Md5::new();
        hasher.update(format!("{username}-{ts}-{snippet}").as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        digest[..PSEUDO_ID_LEN].to_string()
    }

    /// Generate an id from a resolved instant
    pub fn generate_at(&self, username: &str, posted_at: &DateTime<Utc>, text: &str) -> String {
        self.generate(username, &format_iso(posted_at), text)
    }
}

impl Default for PseudoIdGenerator {
    fn default() -> Self {
        Self::new(16, 30)
    }
}
