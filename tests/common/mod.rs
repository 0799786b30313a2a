//! Common test utilities

use chrono::{DateTime, TimeZone, Utc};
use threadsift::parser::ParseSession;

/// Test fixture paths
pub const FIXTURES_DIR: &str = "tests/fixtures";

/// Capture time used across tests
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

/// Default session pinned to [`fixed_now`]
pub fn session() -> ParseSession {
    ParseSession::new().with_now(fixed_now())
}

/// Prefix `lines` with filler that can never be taken for a handle
#[allow(dead_code)]
pub fn padded(filler: usize, lines: &[&str]) -> Vec<String> {
    (0..filler)
        .map(|i| format!("プロフィール項目{i}"))
        .chain(lines.iter().map(|l| l.to_string()))
        .collect()
}

/// Load a fixture split into lines
#[allow(dead_code)]
pub fn load_fixture(filename: &str) -> Vec<String> {
    let path = format!("{FIXTURES_DIR}/{filename}");
    let text =
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {path}"));
    threadsift::utils::split_lines(&text)
}
