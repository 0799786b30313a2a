//! Ticker interest analytics
//!
//! Posts are analyzed by an external LLM service that reports which tickers
//! each post mentions and with what sentiment. This module turns those
//! reports into per-account mention counts and weight ratios.

pub mod weights;

pub use weights::{count_mentions, parse_mentions, recalculate_weights, TickerMention, TickerWeight};
