//! Noise line classification
//!
//! Pasted feeds interleave post bodies with UI residue: like and reply
//! counters, `2 / 5` thread markers, link previews, the author handle
//! repeated under quotes, and "translate" buttons. Each kind of residue is a
//! [`NoiseRuleConfig`] so new platforms or locales can be handled by
//! configuration alone.
//!
//! Rules are evaluated in order and the first match decides the line's kind.
//! Like and reply counters are trailing metadata: they also end the body of
//! the block they appear in.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::models::AccountHandle;
use crate::utils::ascii_digits;
use crate::utils::error::RuleError;

static COUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9０-９][0-9０-９,，]*").unwrap());

/// Kind of UI residue a rule recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    /// `いいね！1,234`
    LikeCount,
    /// `56 件の返信`
    ReplyCount,
    /// `2 / 5`
    ThreadPosition,
    /// Bare `http://` / `https://` line
    Url,
    /// Short-link or link-preview domain
    LinkDomain,
    /// The batch's own handle repeated inside a block
    AccountHandle,
    /// "Translate post" button
    Translate,
    /// Other fixed UI labels
    UiLabel,
}

impl NoiseKind {
    /// Whether lines of this kind carry counts and terminate the body
    pub fn is_trailing_metadata(&self) -> bool {
        matches!(self, Self::LikeCount | Self::ReplyCount)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LikeCount => "like_count",
            Self::ReplyCount => "reply_count",
            Self::ThreadPosition => "thread_position",
            Self::Url => "url",
            Self::LinkDomain => "link_domain",
            Self::AccountHandle => "account_handle",
            Self::Translate => "translate",
            Self::UiLabel => "ui_label",
        }
    }
}

impl fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule's pattern is compared against a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    #[default]
    Regex,
    Prefix,
    Contains,
    Exact,
}

/// One configurable noise rule
///
/// ```toml
/// [[parser.noise_rules]]
/// kind = "link_domain"
/// matcher = "prefix"
/// pattern = "bit.ly"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoiseRuleConfig {
    pub kind: NoiseKind,

    #[serde(default)]
    pub matcher: Matcher,

    /// Ignored for `account_handle`, which matches the detected handle
    #[serde(default)]
    pub pattern: String,
}

impl NoiseRuleConfig {
    pub fn new(kind: NoiseKind, matcher: Matcher, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            matcher,
            pattern: pattern.into(),
        }
    }
}

/// Built-in rule set for Japanese-locale Threads/X profile pastes
pub fn default_noise_rules() -> Vec<NoiseRuleConfig> {
    use Matcher as M;
    use NoiseKind as K;

    vec![
        NoiseRuleConfig::new(K::LikeCount, M::Regex, r"^いいね[！!]?\s*([0-9０-９,，]+)$"),
        NoiseRuleConfig::new(
            K::ReplyCount,
            M::Regex,
            r"^([0-9０-９,，]+)\s*件の(?:返信|リポスト|再投稿)$",
        ),
        NoiseRuleConfig::new(K::ThreadPosition, M::Regex, r"^[0-9０-９]+\s*/\s*[0-9０-９]+$"),
        NoiseRuleConfig::new(K::Url, M::Regex, r"^https?://"),
        NoiseRuleConfig::new(K::LinkDomain, M::Prefix, "amzn.to"),
        NoiseRuleConfig::new(K::LinkDomain, M::Prefix, "a.r10.to"),
        NoiseRuleConfig::new(K::LinkDomain, M::Contains, "npr.org"),
        NoiseRuleConfig::new(K::LinkDomain, M::Contains, "stockstoearn.com"),
        NoiseRuleConfig::new(K::AccountHandle, M::Exact, ""),
        NoiseRuleConfig::new(K::Translate, M::Contains, "翻訳"),
        NoiseRuleConfig::new(K::UiLabel, M::Exact, "·"),
        NoiseRuleConfig::new(K::UiLabel, M::Exact, "投稿者"),
    ]
}

#[derive(Debug, Clone)]
enum CompiledMatcher {
    Regex(Regex),
    Prefix(String),
    Contains(String),
    Exact(String),
    Handle,
}

/// A compiled noise rule
#[derive(Debug, Clone)]
pub struct NoiseRule {
    kind: NoiseKind,
    matcher: CompiledMatcher,
}

impl NoiseRule {
    pub fn compile(config: &NoiseRuleConfig) -> Result<Self, RuleError> {
        let matcher = if config.kind == NoiseKind::AccountHandle {
            CompiledMatcher::Handle
        } else if config.pattern.is_empty() {
            return Err(RuleError::EmptyPattern {
                kind: config.kind.to_string(),
            });
        } else {
            match config.matcher {
                Matcher::Regex => CompiledMatcher::Regex(Regex::new(&config.pattern).map_err(
                    |source| RuleError::InvalidRegex {
                        kind: config.kind.to_string(),
                        pattern: config.pattern.clone(),
                        source,
                    },
                )?),
                Matcher::Prefix => CompiledMatcher::Prefix(config.pattern.clone()),
                Matcher::Contains => CompiledMatcher::Contains(config.pattern.clone()),
                Matcher::Exact => CompiledMatcher::Exact(config.pattern.clone()),
            }
        };

        Ok(Self {
            kind: config.kind,
            matcher,
        })
    }

    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    pub fn matches(&self, line: &str, account: &AccountHandle) -> bool {
        match &self.matcher {
            CompiledMatcher::Regex(re) => re.is_match(line),
            CompiledMatcher::Prefix(p) => line.starts_with(p.as_str()),
            CompiledMatcher::Contains(p) => line.contains(p.as_str()),
            CompiledMatcher::Exact(p) => line == p,
            CompiledMatcher::Handle => account.matches(line),
        }
    }

    /// Count carried by a metadata line
    ///
    /// Uses capture group 1 when the rule's regex has one, otherwise the
    /// first digit run in the line.
    fn extract_count(&self, line: &str) -> Option<u64> {
        let digits = match &self.matcher {
            CompiledMatcher::Regex(re) => re
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
            _ => None,
        }
        .or_else(|| COUNT_REGEX.find(line).map(|m| m.as_str()))?;

        parse_count(digits)
    }
}

/// Parse `1,234` style counts, full-width digits included
pub fn parse_count(digits: &str) -> Option<u64> {
    let stripped: String = ascii_digits(digits).chars().filter(|c| *c != ',').collect();
    stripped.parse().ok()
}

/// First rule that matched a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseMatch {
    pub kind: NoiseKind,
    /// Only set for trailing metadata kinds
    pub count: Option<u64>,
}

impl NoiseMatch {
    pub fn terminates_body(&self) -> bool {
        self.kind.is_trailing_metadata()
    }
}

/// Classifies lines as body text or noise
#[derive(Debug, Clone)]
pub struct NoiseLineClassifier {
    rules: Vec<NoiseRule>,
}

impl NoiseLineClassifier {
    /// Compile a rule set, failing on the first invalid rule
    pub fn new(configs: &[NoiseRuleConfig]) -> Result<Self, RuleError> {
        let rules = configs
            .iter()
            .map(NoiseRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// First matching rule for a line, if any
    pub fn classify(&self, line: &str, account: &AccountHandle) -> Option<NoiseMatch> {
        let rule = self.rules.iter().find(|r| r.matches(line, account))?;
        let count = if rule.kind.is_trailing_metadata() {
            rule.extract_count(line)
        } else {
            None
        };
        Some(NoiseMatch {
            kind: rule.kind,
            count,
        })
    }

    pub fn is_noise(&self, line: &str, account: &AccountHandle) -> bool {
        self.classify(line, account).is_some()
    }
}

impl Default for NoiseLineClassifier {
    fn default() -> Self {
        // The built-in rules are static and known to compile; a failure here
        // is a programming error in default_noise_rules().
        match Self::new(&default_noise_rules()) {
            Ok(classifier) => classifier,
            Err(e) => panic!("Failed to compile default noise rules: {e}"),
        }
    }
}
