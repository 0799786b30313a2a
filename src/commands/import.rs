use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use threadsift::config::Config;
use threadsift::storage::{PostRepository, SqlitePostStore};

/// Parse a pasted profile and store new posts in SQLite
///
/// The store's existing ids seed the seen-set, so importing the same paste
/// twice inserts nothing the second time.
pub async fn import(
    config: &Config,
    input: PathBuf,
    db: Option<PathBuf>,
    now: Option<DateTime<Utc>>,
) -> Result<()> {
    let db_path = db.unwrap_or_else(|| config.storage.sqlite_path.clone());
    let lines = super::read_lines(&input).await?;
    let session = super::session(config, now)?;

    let store = SqlitePostStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    let mut seen = store.seen_ids()?;

    let outcome = session.parse(&lines, &mut seen);
    if outcome.is_empty() {
        println!("Nothing could be extracted from {}", input.display());
        return Ok(());
    }

    let inserted = store.insert_posts(&outcome.records)?;

    println!("Import Summary");
    println!("==============");
    println!("Anchors found: {}", outcome.stats.anchors);
    println!("New posts: {}", outcome.new_count);
    println!("Duplicates skipped: {}", outcome.stats.duplicates);
    println!("Empty skipped: {}", outcome.stats.empty);
    println!("Rows inserted: {inserted}");
    println!("Total stored: {}", store.post_count()?);
    println!("Database: {}", db_path.display());

    Ok(())
}
