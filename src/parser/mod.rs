//! Raw-text post parsing
//!
//! This module recovers structured posts from text copied out of a social
//! feed profile page. The pipeline for one import batch is:
//!
//! 1. normalize lines ([`sanitize`])
//! 2. detect the batch's handle and find post anchors ([`segment`])
//! 3. resolve each anchor's time token ([`time`])
//! 4. strip noise, extract counts and assign a pseudo id ([`noise`],
//!    [`assemble`], [`pseudo_id`])
//! 5. drop empty bodies and ids already in the caller's seen-set
//!
//! Parsing never fails. Unparseable input produces an empty
//! [`ParseOutcome`].

pub mod assemble;
pub mod noise;
pub mod pseudo_id;
pub mod sanitize;
pub mod segment;
pub mod time;

pub use assemble::{CountScan, PostRecordAssembler, Rejection};
pub use noise::{default_noise_rules, Matcher, NoiseKind, NoiseLineClassifier, NoiseRuleConfig};
pub use pseudo_id::PseudoIdGenerator;
pub use segment::{detect_handle, HandleGrammar, PostBlockSegmenter};
pub use time::{TimeExpressionResolver, TimeToken};

use chrono::{DateTime, Utc};

use crate::config::ParserConfig;
use crate::error::{Error, Result};
use crate::models::{ParseOutcome, ParseStats, SeenIdSet};

/// Runs the parsing pipeline over import batches
///
/// A session holds compiled rules and the capture time used to resolve
/// relative time tokens. It owns no dedup state: the seen-set is passed in
/// on every call and must not be shared between concurrent calls.
#[derive(Debug, Clone)]
pub struct ParseSession {
    classifier: NoiseLineClassifier,
    resolver: TimeExpressionResolver,
    ids: PseudoIdGenerator,
    handle_grammar: HandleGrammar,
    segmenter: PostBlockSegmenter,
    now: DateTime<Utc>,
}

impl ParseSession {
    /// Session with built-in rules, JST and the current time
    pub fn new() -> Self {
        Self {
            classifier: NoiseLineClassifier::default(),
            resolver: TimeExpressionResolver::jst(),
            ids: PseudoIdGenerator::default(),
            handle_grammar: HandleGrammar::default(),
            segmenter: PostBlockSegmenter,
            now: Utc::now(),
        }
    }

    /// Session built from configuration
    ///
    /// Fails if a configured noise rule does not compile or the UTC offset
    /// is invalid.
    pub fn from_config(config: &ParserConfig) -> Result<Self> {
        let classifier = match &config.noise_rules {
            Some(rules) => NoiseLineClassifier::new(rules)?,
            None => NoiseLineClassifier::default(),
        };
        let resolver = TimeExpressionResolver::from_offset_hours(config.utc_offset_hours)
            .map_err(|e| Error::config(e.to_string()))?;

        Ok(Self {
            classifier,
            resolver,
            ids: PseudoIdGenerator::new(config.id_timestamp_prefix, config.id_text_prefix),
            handle_grammar: HandleGrammar {
                scan_window: config.handle_scan_window,
                min_len: config.handle_min_len,
                max_len: config.handle_max_len,
            },
            segmenter: PostBlockSegmenter,
            now: Utc::now(),
        })
    }

    /// Override the capture time
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Parse one import batch
    ///
    /// `seen_ids` is read for duplicate detection and every accepted id is
    /// added to it. Returned records are new with respect to the set as it
    /// was passed in.
    pub fn parse<S: AsRef<str>>(&self, lines: &[S], seen_ids: &mut SeenIdSet) -> ParseOutcome {
        if lines.is_empty() {
            tracing::warn!("Input lines are empty, nothing to parse");
            return ParseOutcome::empty();
        }

        tracing::info!(lines = lines.len(), seen = seen_ids.len(), "Starting parse");

        let raw = sanitize::to_raw_lines(lines);

        let Some((account, handle_line)) = detect_handle(&raw, &self.handle_grammar) else {
            tracing::warn!(
                window = self.handle_grammar.scan_window,
                "Could not detect account handle"
            );
            return ParseOutcome::empty();
        };
        tracing::info!(account = %account, line = handle_line, "Detected account handle");

        let anchors = self.segmenter.segment(&raw, &account, handle_line);
        if anchors.is_empty() {
            tracing::warn!(account = %account, "No post anchors found");
            return ParseOutcome::empty();
        }

        let assembler = PostRecordAssembler::new(&self.classifier, self.ids);
        let mut stats = ParseStats {
            anchors: anchors.len(),
            ..ParseStats::default()
        };
        let mut records = Vec::new();

        for block in self.segmenter.blocks(&raw, &anchors) {
            let posted_at = self.resolver.resolve(block.timestamp_token, self.now);

            match assembler.assemble(&block, &account, posted_at, seen_ids) {
                Ok(record) => {
                    tracing::debug!(
                        post_id = %record.post_id,
                        line = block.anchor.timestamp_line_index,
                        "Added new post"
                    );
                    records.push(record);
                }
                Err(Rejection::EmptyBody) => {
                    tracing::debug!(
                        line = block.anchor.timestamp_line_index,
                        "Skipped post with empty text after cleaning"
                    );
                    stats.empty += 1;
                }
                Err(Rejection::Duplicate { post_id }) => {
                    tracing::debug!(post_id = %post_id, "Skipped duplicate post");
                    stats.duplicates += 1;
                }
            }
        }

        stats.accepted = records.len();
        tracing::info!(
            account = %account,
            anchors = stats.anchors,
            accepted = stats.accepted,
            duplicates = stats.duplicates,
            empty = stats.empty,
            "Parsing complete"
        );

        ParseOutcome {
            new_count: records.len(),
            records,
            stats,
        }
    }
}

impl Default for ParseSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a batch with default settings at the current time
pub fn parse_lines<S: AsRef<str>>(lines: &[S], seen_ids: &mut SeenIdSet) -> ParseOutcome {
    ParseSession::new().parse(lines, seen_ids)
}
