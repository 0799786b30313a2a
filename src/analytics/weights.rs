//! Mention counting and per-account weight ratios

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::Result;

/// One ticker mention reported by the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMention {
    /// Post id (or batch-local reference) the mention came from
    #[serde(default)]
    pub post_ref: String,
    pub ticker: String,
    #[serde(default)]
    pub sentiment: String,
    #[serde(default)]
    pub reasoning: String,
}

/// Accumulated mentions of one ticker by one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerWeight {
    pub account: String,
    pub ticker: String,
    pub total_mentions: u64,
    /// Share of the account's mentions, 0.0 - 1.0
    pub weight_ratio: f64,
}

impl TickerWeight {
    pub fn new(account: impl Into<String>, ticker: impl Into<String>, total_mentions: u64) -> Self {
        Self {
            account: account.into(),
            ticker: ticker.into(),
            total_mentions,
            weight_ratio: 0.0,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnalyzerOutput {
    Bare(Vec<TickerMention>),
    Wrapped { results: Vec<TickerMention> },
}

/// Parse analyzer output
///
/// Accepts a bare JSON array of mentions or an object with a `results` array.
pub fn parse_mentions(json: &str) -> Result<Vec<TickerMention>> {
    let output: AnalyzerOutput = serde_json::from_str(json)?;
    Ok(match output {
        AnalyzerOutput::Bare(mentions) => mentions,
        AnalyzerOutput::Wrapped { results } => results,
    })
}

/// Mentions per ticker, tickers upper-cased, blanks ignored
pub fn count_mentions(mentions: &[TickerMention]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for mention in mentions {
        let ticker = mention.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            continue;
        }
        *counts.entry(ticker).or_insert(0) += 1;
    }
    counts
}

/// Recompute `weight_ratio` for every account present
///
/// Ratios are each ticker's share of its account's total mentions. Accounts
/// without mentions are left untouched. Returns the number of accounts
/// recalculated.
pub fn recalculate_weights(weights: &mut [TickerWeight]) -> usize {
    let mut totals: HashMap<String, u64> = HashMap::new();
    for w in weights.iter() {
        *totals.entry(w.account.clone()).or_insert(0) += w.total_mentions;
    }

    for w in weights.iter_mut() {
        let total = totals.get(&w.account).copied().unwrap_or(0);
        if total > 0 {
            w.weight_ratio = w.total_mentions as f64 / total as f64;
        }
    }

    let processed = totals.values().filter(|&&total| total > 0).count();
    for (account, total) in &totals {
        if *total == 0 {
            tracing::info!(account = %account, "Skipping account without mentions");
        }
    }
    tracing::info!(accounts = processed, "Recalculated ticker weights");

    processed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(ticker: &str) -> TickerMention {
        TickerMention {
            post_ref: "p1".to_string(),
            ticker: ticker.to_string(),
            sentiment: "positive".to_string(),
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_count_mentions_normalizes_tickers() {
        let counts = count_mentions(&[mention("nvda"), mention(" NVDA "), mention("7203"), mention("")]);
        assert_eq!(counts.get("NVDA"), Some(&2));
        assert_eq!(counts.get("7203"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_recalculate_weights_per_account() {
        let mut weights = vec![
            TickerWeight::new("alice", "NVDA", 11),
            TickerWeight::new("alice", "AAPL", 9),
            TickerWeight::new("bob", "7203", 4),
            TickerWeight::new("carol", "TSLA", 0),
        ];

        let processed = recalculate_weights(&mut weights);

        assert_eq!(processed, 2);
        assert!((weights[0].weight_ratio - 0.55).abs() < 1e-9);
        assert!((weights[1].weight_ratio - 0.45).abs() < 1e-9);
        assert!((weights[2].weight_ratio - 1.0).abs() < 1e-9);
        assert_eq!(weights[3].weight_ratio, 0.0);
    }

    #[test]
    fn test_parse_mentions_bare_and_wrapped() {
        let bare = r#"[{"post_ref": "a1", "ticker": "NVDA", "sentiment": "positive", "reasoning": "beat"}]"#;
        let mentions = parse_mentions(bare).unwrap();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].reasoning, "beat");

        let wrapped = r#"{"results": [{"ticker": "AAPL"}, {"ticker": "MSFT", "sentiment": "neutral"}]}"#;
        let mentions = parse_mentions(wrapped).unwrap();
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].post_ref, "");
    }

    #[test]
    fn test_parse_mentions_rejects_other_shapes() {
        assert!(parse_mentions(r#"{"summary": "none"}"#).is_err());
        assert!(parse_mentions("not json").is_err());
    }
}
