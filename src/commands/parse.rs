use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use threadsift::config::Config;
use threadsift::models::SeenIdSet;

/// Parse a pasted profile and print new records as JSON
///
/// With `--seen`, ids are read from a JSON array file and the file is
/// rewritten with the accepted ids added.
pub async fn parse(
    config: &Config,
    input: PathBuf,
    seen_file: Option<PathBuf>,
    now: Option<DateTime<Utc>>,
) -> Result<()> {
    let lines = super::read_lines(&input).await?;
    let session = super::session(config, now)?;

    let mut seen = match &seen_file {
        Some(path) => load_seen(path).await?,
        None => SeenIdSet::new(),
    };

    let outcome = session.parse(&lines, &mut seen);

    if outcome.is_empty() {
        eprintln!("Nothing could be extracted from {}", input.display());
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&outcome.records)?);
    eprintln!(
        "{} new posts ({} anchors, {} duplicates, {} empty)",
        outcome.new_count, outcome.stats.anchors, outcome.stats.duplicates, outcome.stats.empty
    );

    if let Some(path) = &seen_file {
        save_seen(path, &seen).await?;
    }

    Ok(())
}

async fn load_seen(path: &Path) -> Result<SeenIdSet> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Ok(SeenIdSet::new());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read seen-id file: {}", path.display()))?;
    let ids: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("Seen-id file is not a JSON array: {}", path.display()))?;

    Ok(ids.into_iter().collect())
}

async fn save_seen(path: &Path, seen: &SeenIdSet) -> Result<()> {
    let mut ids: Vec<&String> = seen.iter().collect();
    ids.sort();

    tokio::fs::write(path, serde_json::to_string_pretty(&ids)?)
        .await
        .with_context(|| format!("Failed to write seen-id file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), ids = ids.len(), "Saved seen ids");
    Ok(())
}
