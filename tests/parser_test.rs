//! Parser integration tests over pasted profile text

mod common;

use common::{fixed_now, load_fixture, padded, session};
use proptest::prelude::*;
use threadsift::models::{AccountHandle, AnchorLayout, SeenIdSet};
use threadsift::parser::sanitize::to_raw_lines;
use threadsift::parser::{PostBlockSegmenter, PseudoIdGenerator, TimeExpressionResolver};
use threadsift::utils::decode_input;

// ============================================================================
// Fixture Tests
// ============================================================================

#[test]
fn test_fixture_extracts_all_posts() {
    let lines = load_fixture("threads_profile.txt");
    let mut seen = SeenIdSet::new();
    let outcome = session().parse(&lines, &mut seen);

    assert_eq!(outcome.new_count, 3);
    assert_eq!(outcome.stats.anchors, 4);
    assert_eq!(outcome.stats.empty, 1);
    assert_eq!(outcome.stats.duplicates, 0);
    assert_eq!(seen.len(), 3);

    let records = &outcome.records;
    assert!(records.iter().all(|r| r.username == "kabu_note.jp"));

    assert_eq!(records[0].original_text, "$NVDA 決算良好。押し目は拾いたい");
    assert_eq!(records[0].posted_at_iso(), "2025-01-01T09:00:00Z");
    assert_eq!(records[0].like_count, 1234);
    assert_eq!(records[0].retweet_count, 56);

    assert_eq!(records[1].original_text, "トヨタ 7203 は円安メリット");
    assert_eq!(records[1].posted_at_iso(), "2024-12-31T03:00:00Z");
    assert_eq!(records[1].like_count, 12);
    assert_eq!(records[1].retweet_count, 0);

    assert_eq!(records[2].original_text, "スレッドの続き");
    assert_eq!(records[2].posted_at_iso(), "2025-11-09T03:00:00Z");
    assert_eq!(records[2].like_count, 3);
    assert_eq!(records[2].retweet_count, 2);
}

#[test]
fn test_fixture_in_shift_jis() {
    let text = load_fixture("threads_profile.txt").join("\r\n");
    let (bytes, _, had_errors) = encoding_rs::SHIFT_JIS.encode(&text);
    assert!(!had_errors);

    let decoded = decode_input(&bytes).unwrap();
    let lines = threadsift::utils::split_lines(&decoded);

    let mut seen = SeenIdSet::new();
    let from_sjis = session().parse(&lines, &mut seen);

    let mut seen = SeenIdSet::new();
    let from_utf8 = session().parse(&load_fixture("threads_profile.txt"), &mut seen);

    assert_eq!(from_sjis.records, from_utf8.records);
}

#[test]
fn test_records_serialize_to_json() {
    let lines = load_fixture("threads_profile.txt");
    let mut seen = SeenIdSet::new();
    let outcome = session().parse(&lines, &mut seen);

    let json = serde_json::to_value(&outcome.records[0]).unwrap();
    assert_eq!(json["username"], "kabu_note.jp");
    assert_eq!(json["posted_at"], "2025-01-01T09:00:00Z");
    assert_eq!(json["source_url"], "");
    assert_eq!(json["like_count"], 1234);
    assert_eq!(json["post_id"].as_str().unwrap().len(), 10);
}

// ============================================================================
// Behavioral Properties
// ============================================================================

#[test]
fn test_reimport_with_carried_seen_ids_yields_nothing() {
    let lines = load_fixture("threads_profile.txt");
    let mut seen = SeenIdSet::new();

    let first = session().parse(&lines, &mut seen);
    assert_eq!(first.new_count, 3);

    let second = session().parse(&lines, &mut seen);
    assert_eq!(second.new_count, 0);
    assert!(second.records.is_empty());
    assert_eq!(second.stats.duplicates, 3);
}

#[test]
fn test_hours_ago_resolution() {
    let resolver = TimeExpressionResolver::jst();
    let resolved = resolver.resolve("3時間前", fixed_now());
    assert_eq!(resolved.to_rfc3339(), "2025-01-01T09:00:00+00:00");
}

#[test]
fn test_inline_anchor_single_post() {
    let lines = padded(10, &["alice", "3分前", "hello world"]);
    let mut seen = SeenIdSet::new();
    let outcome = session().parse(&lines, &mut seen);

    assert_eq!(outcome.new_count, 1);
    assert_eq!(outcome.records[0].original_text, "hello world");
    assert_eq!(outcome.records[0].posted_at_iso(), "2025-01-01T11:57:00Z");
}

#[test]
fn test_thread_numbered_anchor() {
    let lines = padded(
        3,
        &[
            "alice", "2時間前", "first", "2", "/", "5", "alice", "1時間前", "body text",
        ],
    );

    let raw = to_raw_lines(&lines);
    let anchors = PostBlockSegmenter.segment(&raw, &AccountHandle::new("alice"), 3);
    assert_eq!(anchors.len(), 2);
    assert_eq!(raw[anchors[1].account_line_index].text, "alice");
    assert_eq!(raw[anchors[1].timestamp_line_index].text, "1時間前");
    assert_eq!(anchors[1].layout, AnchorLayout::ThreadNumbered);

    let mut seen = SeenIdSet::new();
    let outcome = session().parse(&lines, &mut seen);
    let texts: Vec<&str> = outcome
        .records
        .iter()
        .map(|r| r.original_text.as_str())
        .collect();
    assert_eq!(texts, vec!["first", "body text"]);
}

#[test]
fn test_noise_exclusion_and_counts() {
    let lines = padded(
        2,
        &["alice", "5分前", "great stock", "いいね！1,234", "56 件の返信"],
    );
    let mut seen = SeenIdSet::new();
    let outcome = session().parse(&lines, &mut seen);

    let record = &outcome.records[0];
    assert_eq!(record.original_text, "great stock");
    assert_eq!(record.like_count, 1234);
    assert_eq!(record.retweet_count, 56);
}

#[test]
fn test_full_width_digits_in_time_and_counts() {
    let lines = padded(2, &["alice", "３時間前", "body", "いいね！１,２３４", "５６ 件の返信"]);
    let mut seen = SeenIdSet::new();
    let outcome = session().parse(&lines, &mut seen);

    let record = &outcome.records[0];
    assert_eq!(record.original_text, "body");
    assert_eq!(record.posted_at_iso(), "2025-01-01T09:00:00Z");
    assert_eq!(record.like_count, 1234);
    assert_eq!(record.retweet_count, 56);
}

#[test]
fn test_link_only_post_is_dropped_without_seen_entry() {
    let lines = padded(2, &["alice", "5分前", "https://example.com/only-a-link"]);
    let mut seen = SeenIdSet::new();
    let outcome = session().parse(&lines, &mut seen);

    assert!(outcome.is_empty());
    assert_eq!(outcome.stats.empty, 1);
    assert!(seen.is_empty());
}

#[test]
fn test_handle_outside_scan_window() {
    let lines = padded(15, &["alice", "3分前", "hello world"]);
    let mut seen = SeenIdSet::new();
    let outcome = session().parse(&lines, &mut seen);

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.new_count, 0);
}

#[test]
fn test_empty_input() {
    let mut seen = SeenIdSet::new();
    let outcome = threadsift::parse_lines::<String>(&[], &mut seen);
    assert!(outcome.records.is_empty());
    assert_eq!(outcome.new_count, 0);
}

#[test]
fn test_unparseable_time_falls_back_to_now() {
    let resolver = TimeExpressionResolver::jst();
    assert_eq!(resolver.resolve("先週", fixed_now()), fixed_now());
    assert_eq!(resolver.resolve("2025/13/40", fixed_now()), fixed_now());
}

#[test]
fn test_seen_ids_from_store_suppress_posts() {
    let lines = padded(1, &["alice", "1分前", "a", "alice", "2分前", "b"]);

    let mut seen = SeenIdSet::new();
    let full = session().parse(&lines, &mut seen);
    assert_eq!(full.new_count, 2);

    let mut seen: SeenIdSet = std::iter::once(full.records[0].post_id.clone()).collect();
    let partial = session().parse(&lines, &mut seen);
    assert_eq!(partial.new_count, 1);
    assert_eq!(partial.records[0].original_text, "b");
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_pseudo_id_is_deterministic(
        username in "[a-z0-9_.]{5,20}",
        minutes in 0i64..100_000,
        text in "\\PC{0,80}",
    ) {
        let ids = PseudoIdGenerator::default();
        let at = fixed_now() - chrono::Duration::minutes(minutes);
        let iso = threadsift::models::format_iso(&at);

        let first = ids.generate(&username, &iso, &text);
        let second = ids.generate(&username, &iso, &text);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), 10);
        prop_assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn prop_reimport_is_idempotent(
        bodies in prop::collection::vec("[a-zA-Zぁ-ん ]{1,30}", 1..8),
    ) {
        let mut lines = vec!["alice".to_string()];
        for (i, body) in bodies.iter().enumerate() {
            lines.push("alice".to_string());
            lines.push(format!("{}分前", i + 1));
            lines.push(format!("本文 {body}"));
        }

        let mut seen = SeenIdSet::new();
        let first = session().parse(&lines, &mut seen);
        prop_assert_eq!(first.new_count, bodies.len());

        let second = session().parse(&lines, &mut seen);
        prop_assert_eq!(second.new_count, 0);
    }
}
