//! Post persistence with SQLite
//!
//! The parser owns no storage. This module is the caller side of that
//! contract: it persists accepted records keyed by `post_id` and hands the
//! set of persisted ids back as the seen-set for the next import, which makes
//! re-importing the same paste a no-op.
//!
//! # Usage
//!
//! ```no_run
//! use threadsift::parser::ParseSession;
//! use threadsift::storage::{PostRepository, SqlitePostStore};
//!
//! # fn example(lines: &[String]) -> threadsift::error::Result<()> {
//! let store = SqlitePostStore::open("data/threadsift.db")?;
//! let mut seen = store.seen_ids()?;
//! let outcome = ParseSession::new().parse(lines, &mut seen);
//! store.insert_posts(&outcome.records)?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::analytics::TickerWeight;
use crate::error::{Error, Result};
use crate::models::{ParsedPostRecord, SeenIdSet};

/// Repository for parsed posts
///
/// Implementations must treat `post_id` as a unique key.
pub trait PostRepository: Send + Sync {
    /// All persisted post ids
    fn seen_ids(&self) -> Result<SeenIdSet>;

    /// Persist records, ignoring ids that already exist
    ///
    /// Returns the number of rows actually inserted.
    fn insert_posts(&self, records: &[ParsedPostRecord]) -> Result<usize>;

    /// Number of persisted posts
    fn post_count(&self) -> Result<usize>;

    /// Posts of one account, oldest first
    fn posts_for(&self, username: &str) -> Result<Vec<ParsedPostRecord>>;
}

/// SQLite-backed post and ticker weight store
pub struct SqlitePostStore {
    conn: Mutex<Connection>,
}

impl SqlitePostStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite post store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::other("SQLite connection mutex poisoned"))
    }

    /// Create database schema
    fn create_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS collected_posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    post_id TEXT NOT NULL UNIQUE,
                    username TEXT NOT NULL,
                    posted_at TEXT NOT NULL,
                    original_text TEXT NOT NULL,
                    source_url TEXT NOT NULL DEFAULT '',
                    like_count INTEGER NOT NULL DEFAULT 0,
                    retweet_count INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_collected_posts_username
                    ON collected_posts(username);

                CREATE INDEX IF NOT EXISTS idx_collected_posts_posted_at
                    ON collected_posts(posted_at);

                CREATE TABLE IF NOT EXISTS ticker_weights (
                    account TEXT NOT NULL,
                    ticker TEXT NOT NULL,
                    total_mentions INTEGER NOT NULL DEFAULT 0,
                    weight_ratio REAL NOT NULL DEFAULT 0.0,
                    PRIMARY KEY (account, ticker)
                );
                "#,
        )?;

        Ok(())
    }

    /// Add mentions of a ticker for an account
    pub fn add_mentions(&self, account: &str, ticker: &str, mentions: u64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
                INSERT INTO ticker_weights (account, ticker, total_mentions, weight_ratio)
                VALUES (?1, ?2, ?3, 0.0)
                ON CONFLICT(account, ticker)
                DO UPDATE SET total_mentions = total_mentions + excluded.total_mentions
                "#,
            params![account, ticker, to_sql_count(mentions)],
        )?;
        Ok(())
    }

    /// Stored ticker weights, optionally for one account
    pub fn ticker_weights(&self, account: Option<&str>) -> Result<Vec<TickerWeight>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT account, ticker, total_mentions, weight_ratio FROM ticker_weights
             WHERE ?1 IS NULL OR account = ?1
             ORDER BY account, total_mentions DESC, ticker",
        )?;

        let weights = stmt
            .query_map(params![account], |row| {
                Ok(TickerWeight {
                    account: row.get(0)?,
                    ticker: row.get(1)?,
                    total_mentions: from_sql_count(row.get(2)?),
                    weight_ratio: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(weights)
    }

    /// Persist recalculated weight ratios
    pub fn save_weights(&self, weights: &[TickerWeight]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE ticker_weights SET weight_ratio = ?3 WHERE account = ?1 AND ticker = ?2",
            )?;
            for w in weights {
                stmt.execute(params![w.account, w.ticker, w.weight_ratio])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl PostRepository for SqlitePostStore {
    fn seen_ids(&self) -> Result<SeenIdSet> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT post_id FROM collected_posts")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<SeenIdSet>>()?;
        Ok(ids)
    }

    fn insert_posts(&self, records: &[ParsedPostRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let created_at = crate::models::format_iso(&Utc::now());

        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                    INSERT OR IGNORE INTO collected_posts
                        (post_id, username, posted_at, original_text, source_url,
                         like_count, retweet_count, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
            )?;

            for record in records {
                inserted += stmt.execute(params![
                    record.post_id,
                    record.username,
                    record.posted_at_iso(),
                    record.original_text,
                    record.source_url,
                    to_sql_count(record.like_count),
                    to_sql_count(record.retweet_count),
                    created_at,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(offered = records.len(), inserted = inserted, "Stored posts");
        Ok(inserted)
    }

    fn post_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM collected_posts", [], |row| {
            row.get(0)
        })?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn posts_for(&self, username: &str) -> Result<Vec<ParsedPostRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT username, posted_at, original_text, post_id, source_url, like_count, retweet_count
             FROM collected_posts WHERE username = ?1 ORDER BY posted_at, id",
        )?;

        let posts = stmt
            .query_map(params![username], record_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(posts)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ParsedPostRecord> {
    let posted_at: String = row.get(1)?;
    let posted_at = DateTime::parse_from_rfc3339(&posted_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(ParsedPostRecord {
        username: row.get(0)?,
        posted_at,
        original_text: row.get(2)?,
        post_id: row.get(3)?,
        source_url: row.get(4)?,
        like_count: from_sql_count(row.get(5)?),
        retweet_count: from_sql_count(row.get(6)?),
    })
}

fn to_sql_count(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

fn from_sql_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(post_id: &str, text: &str) -> ParsedPostRecord {
        ParsedPostRecord {
            username: "alice".to_string(),
            posted_at: Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            original_text: text.to_string(),
            post_id: post_id.to_string(),
            source_url: String::new(),
            like_count: 1234,
            retweet_count: 56,
        }
    }

    #[test]
    fn test_sqlite_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("posts.db");
        let store = SqlitePostStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.post_count().unwrap(), 0);
    }

    #[test]
    fn test_insert_is_keyed_by_post_id() {
        let store = SqlitePostStore::in_memory().unwrap();
        let inserted = store
            .insert_posts(&[record("aaaaaaaaaa", "one"), record("bbbbbbbbbb", "two")])
            .unwrap();
        assert_eq!(inserted, 2);

        let again = store
            .insert_posts(&[record("aaaaaaaaaa", "changed"), record("cccccccccc", "three")])
            .unwrap();
        assert_eq!(again, 1);
        assert_eq!(store.post_count().unwrap(), 3);

        let seen = store.seen_ids().unwrap();
        assert!(seen.contains("aaaaaaaaaa"));
        assert!(seen.contains("cccccccccc"));
    }

    #[test]
    fn test_posts_round_trip() {
        let store = SqlitePostStore::in_memory().unwrap();
        let original = record("aaaaaaaaaa", "決算良好");
        store.insert_posts(std::slice::from_ref(&original)).unwrap();

        let posts = store.posts_for("alice").unwrap();
        assert_eq!(posts, vec![original]);
        assert!(store.posts_for("bob").unwrap().is_empty());
    }

    #[test]
    fn test_mentions_accumulate_and_weights_persist() {
        let store = SqlitePostStore::in_memory().unwrap();
        store.add_mentions("alice", "NVDA", 3).unwrap();
        store.add_mentions("alice", "NVDA", 2).unwrap();
        store.add_mentions("alice", "AAPL", 5).unwrap();
        store.add_mentions("bob", "7203", 1).unwrap();

        let mut weights = store.ticker_weights(Some("alice")).unwrap();
        assert_eq!(weights.len(), 2);
        assert!(weights.iter().all(|w| w.total_mentions == 5));

        crate::analytics::recalculate_weights(&mut weights);
        store.save_weights(&weights).unwrap();

        let stored = store.ticker_weights(Some("alice")).unwrap();
        assert!(stored.iter().all(|w| (w.weight_ratio - 0.5).abs() < 1e-9));

        let all = store.ticker_weights(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].account, "bob");
        assert_eq!(all[2].weight_ratio, 0.0);
    }
}
