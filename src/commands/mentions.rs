use anyhow::{Context, Result};
use std::path::PathBuf;

use threadsift::analytics::{count_mentions, parse_mentions, recalculate_weights};
use threadsift::config::Config;
use threadsift::storage::SqlitePostStore;

/// Record analyzer mentions for an account and refresh its weights
pub async fn mentions(
    config: &Config,
    json: PathBuf,
    account: String,
    db: Option<PathBuf>,
) -> Result<()> {
    let db_path = db.unwrap_or_else(|| config.storage.sqlite_path.clone());

    let content = tokio::fs::read_to_string(&json)
        .await
        .with_context(|| format!("Failed to read analyzer output: {}", json.display()))?;
    let parsed = parse_mentions(&content)
        .with_context(|| format!("Invalid analyzer output: {}", json.display()))?;

    let counts = count_mentions(&parsed);
    if counts.is_empty() {
        println!("No ticker mentions in {}", json.display());
        return Ok(());
    }

    let store = SqlitePostStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    for (ticker, count) in &counts {
        store.add_mentions(&account, ticker, *count)?;
    }

    let mut weights = store.ticker_weights(Some(&account))?;
    recalculate_weights(&mut weights);
    store.save_weights(&weights)?;

    tracing::info!(account = %account, tickers = counts.len(), "Recorded mentions");

    super::weights::print_weights(&weights);
    Ok(())
}
