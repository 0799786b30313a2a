pub mod import;
pub mod mentions;
pub mod parse;
pub mod weights;

// Re-export command functions for convenience
pub use import::import;
pub use mentions::mentions;
pub use parse::parse;
pub use weights::weights;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

use threadsift::config::Config;
use threadsift::parser::ParseSession;
use threadsift::utils::{decode_input, split_lines};

/// Read a pasted profile dump and split it into lines
pub(crate) async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let text = decode_input(&bytes)
        .with_context(|| format!("Failed to decode input file: {}", path.display()))?;

    Ok(split_lines(&text))
}

/// Build a parse session from configuration, pinned to `now` if given
pub(crate) fn session(config: &Config, now: Option<DateTime<Utc>>) -> Result<ParseSession> {
    let session =
        ParseSession::from_config(&config.parser).context("Failed to build parse session")?;

    Ok(match now {
        Some(now) => session.with_now(now),
        None => session,
    })
}

/// Parse a `--now` argument
pub(crate) fn parse_now(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid --now timestamp '{value}', expected RFC 3339"))
}
