use anyhow::{Context, Result};
use std::path::PathBuf;

use threadsift::analytics::{recalculate_weights, TickerWeight};
use threadsift::config::Config;
use threadsift::storage::SqlitePostStore;

/// Recalculate and show stored ticker weights
pub async fn weights(config: &Config, db: Option<PathBuf>, account: Option<String>) -> Result<()> {
    let db_path = db.unwrap_or_else(|| config.storage.sqlite_path.clone());
    let store = SqlitePostStore::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    let mut weights = store.ticker_weights(account.as_deref())?;
    if weights.is_empty() {
        println!("No ticker weights stored");
        return Ok(());
    }

    recalculate_weights(&mut weights);
    store.save_weights(&weights)?;

    print_weights(&weights);
    Ok(())
}

pub(crate) fn print_weights(weights: &[TickerWeight]) {
    println!("{:<20} {:<10} {:>8} {:>8}", "Account", "Ticker", "Mentions", "Weight");
    println!("{}", "-".repeat(49));
    for w in weights {
        println!(
            "{:<20} {:<10} {:>8} {:>7.1}%",
            w.account,
            w.ticker,
            w.total_mentions,
            w.weight_ratio * 100.0
        );
    }
}
