//! Turns a post block into a [`ParsedPostRecord`]

use chrono::{DateTime, Utc};

use super::noise::{NoiseKind, NoiseLineClassifier};
use super::pseudo_id::PseudoIdGenerator;
use super::sanitize::clean_body;
use crate::models::{AccountHandle, ParsedPostRecord, PostBlock, RawLine, SeenIdSet};

/// Why a block produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing left after removing noise
    EmptyBody,
    /// Id already in the seen-set
    Duplicate { post_id: String },
}

/// Counts found while walking a block from its last line upward
///
/// The marker nearest the end of the block wins, and the walk stops as soon
/// as both counts are known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountScan {
    pub like: Option<u64>,
    pub reply: Option<u64>,
}

impl CountScan {
    pub fn is_complete(&self) -> bool {
        self.like.is_some() && self.reply.is_some()
    }

    /// Record a count for a metadata kind unless one was already found
    fn offer(&mut self, kind: NoiseKind, count: Option<u64>) {
        let slot = match kind {
            NoiseKind::LikeCount => &mut self.like,
            NoiseKind::ReplyCount => &mut self.reply,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(count.unwrap_or(0));
        }
    }

    pub fn like_count(&self) -> u64 {
        self.like.unwrap_or(0)
    }

    pub fn reply_count(&self) -> u64 {
        self.reply.unwrap_or(0)
    }
}

/// Builds records from blocks and filters them against the seen-set
#[derive(Debug, Clone)]
pub struct PostRecordAssembler<'a> {
    classifier: &'a NoiseLineClassifier,
    ids: PseudoIdGenerator,
}

impl<'a> PostRecordAssembler<'a> {
    pub fn new(classifier: &'a NoiseLineClassifier, ids: PseudoIdGenerator) -> Self {
        Self { classifier, ids }
    }

    /// Body text of a block
    ///
    /// Noise lines are skipped; the first like/reply counter ends the body.
    pub fn body_text(&self, lines: &[RawLine], account: &AccountHandle) -> String {
        let mut body = Vec::new();

        for line in lines.iter().filter(|l| !l.is_blank()) {
            match self.classifier.classify(&line.text, account) {
                Some(m) if m.terminates_body() => break,
                Some(_) => continue,
                None => body.push(line.text.as_str()),
            }
        }

        clean_body(&body.join("\n"))
    }

    /// Like and reply counts of a block, scanning from the end
    pub fn scan_counts(&self, lines: &[RawLine], account: &AccountHandle) -> CountScan {
        let mut scan = CountScan::default();

        for line in lines.iter().rev() {
            if scan.is_complete() {
                break;
            }
            if let Some(m) = self.classifier.classify(&line.text, account) {
                scan.offer(m.kind, m.count);
            }
        }

        scan
    }

    /// Assemble a block, adding the new id to `seen_ids` on success
    pub fn assemble(
        &self,
        block: &PostBlock<'_>,
        account: &AccountHandle,
        posted_at: DateTime<Utc>,
        seen_ids: &mut SeenIdSet,
    ) -> Result<ParsedPostRecord, Rejection> {
        let original_text = self.body_text(block.lines, account);
        if original_text.is_empty() {
            return Err(Rejection::EmptyBody);
        }

        let post_id = self
            .ids
            .generate_at(account.as_str(), &posted_at, &original_text);
        if seen_ids.contains(&post_id) {
            return Err(Rejection::Duplicate { post_id });
        }

        let counts = self.scan_counts(block.lines, account);
        seen_ids.insert(post_id.clone());

        Ok(ParsedPostRecord {
            username: account.as_str().to_string(),
            posted_at,
            original_text,
            post_id,
            source_url: String::new(),
            like_count: counts.like_count(),
            retweet_count: counts.reply_count(),
        })
    }
}
