//! Post boundary detection
//!
//! A pasted profile has no delimiters between posts. The only reliable
//! boundary is a header: the author's handle immediately followed by a time
//! token. Some headers are preceded by a thread position split over three
//! lines (`2`, `/`, `5`), which must not be mistaken for body text of the
//! previous post.
//!
//! Scanning is a single left-to-right pass. After an anchor is emitted the
//! cursor jumps past its time token, so anchors never share lines.

use regex::Regex;
use std::sync::LazyLock;

use super::time::TimeExpressionResolver;
use crate::models::{AccountHandle, AnchorLayout, PostAnchor, PostBlock, RawLine};

static HANDLE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._]+$").unwrap());

static BARE_INT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

/// Where and how strictly to look for the batch's handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleGrammar {
    pub scan_window: usize,
    pub min_len: usize,
    pub max_len: usize,
}

impl HandleGrammar {
    pub fn accepts(&self, line: &str) -> bool {
        (self.min_len..=self.max_len).contains(&line.len()) && HANDLE_REGEX.is_match(line)
    }
}

impl Default for HandleGrammar {
    fn default() -> Self {
        Self {
            scan_window: 15,
            min_len: 5,
            max_len: 30,
        }
    }
}

/// Find the batch's handle in the first `scan_window` lines
///
/// Returns the handle and the index of the line it was found on.
pub fn detect_handle(lines: &[RawLine], grammar: &HandleGrammar) -> Option<(AccountHandle, usize)> {
    lines
        .iter()
        .take(grammar.scan_window)
        .find(|line| grammar.accepts(&line.text))
        .map(|line| (AccountHandle::new(line.text.clone()), line.index))
}

/// Finds post anchors in a line sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct PostBlockSegmenter;

impl PostBlockSegmenter {
    /// Scan from `start` and return anchors in file order
    ///
    /// An empty result means the input could not be segmented.
    pub fn segment(
        &self,
        lines: &[RawLine],
        account: &AccountHandle,
        start: usize,
    ) -> Vec<PostAnchor> {
        let text = |i: usize| lines.get(i).map(|l| l.text.as_str());
        let is_handle = |i: usize| text(i).is_some_and(|t| account.matches(t));
        let is_time = |i: usize| text(i).is_some_and(TimeExpressionResolver::is_time_token);
        let is_int = |i: usize| text(i).is_some_and(|t| BARE_INT_REGEX.is_match(t));

        let mut anchors = Vec::new();
        let mut cursor = start;

        while cursor < lines.len() {
            if is_handle(cursor) && is_time(cursor + 1) {
                anchors.push(PostAnchor {
                    account_line_index: cursor,
                    timestamp_line_index: cursor + 1,
                    layout: AnchorLayout::Inline,
                });
                cursor += 2;
                continue;
            }

            if is_int(cursor)
                && text(cursor + 1) == Some("/")
                && is_int(cursor + 2)
                && is_handle(cursor + 3)
                && is_time(cursor + 4)
            {
                anchors.push(PostAnchor {
                    account_line_index: cursor + 3,
                    timestamp_line_index: cursor + 4,
                    layout: AnchorLayout::ThreadNumbered,
                });
                cursor += 5;
                continue;
            }

            cursor += 1;
        }

        tracing::debug!(anchors = anchors.len(), start = start, "Segmentation finished");
        anchors
    }

    /// Slice the lines owned by each anchor
    ///
    /// A block runs from the line after the anchor's time token up to the
    /// next anchor's header, or to the end of input for the last anchor.
    pub fn blocks<'a>(&self, lines: &'a [RawLine], anchors: &[PostAnchor]) -> Vec<PostBlock<'a>> {
        anchors
            .iter()
            .enumerate()
            .map(|(k, anchor)| {
                let end = anchors
                    .get(k + 1)
                    .map(PostAnchor::header_start)
                    .unwrap_or(lines.len())
                    .min(lines.len());
                let start = (anchor.timestamp_line_index + 1).min(end);

                PostBlock {
                    anchor: *anchor,
                    timestamp_token: lines
                        .get(anchor.timestamp_line_index)
                        .map(|l| l.text.as_str())
                        .unwrap_or_default(),
                    lines: &lines[start..end],
                }
            })
            .collect()
    }
}
