//! Resolution of feed time tokens into absolute UTC instants
//!
//! Feeds render post times as short Japanese tokens relative to the moment
//! the page was captured (`3時間前`, `昨日`, `5日`) or as calendar dates
//! (`11月9日`, `2024年11月9日`, `2025/11/09`). Grammars are checked in a
//! fixed precedence order and the first match wins.
//!
//! Kanji calendar forms and `昨日` carry no time of day and are pinned to
//! local noon. The slash form is pinned to UTC midnight instead; existing
//! imports depend on that, so it is kept as is.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Timelike, Utc,
};
use regex::Regex;
use std::sync::LazyLock;

use crate::utils::ascii_digits;
use crate::utils::error::TimeParseError;

/// Recognized token grammars, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grammar {
    MinutesAgo,
    HoursAgo,
    Hours,
    Yesterday,
    Days,
    MonthDay,
    YearMonthDay,
    SlashDate,
}

static GRAMMARS: LazyLock<Vec<(Grammar, Regex)>> = LazyLock::new(|| {
    vec![
        (Grammar::MinutesAgo, Regex::new(r"^([0-9０-９]+)分前$").unwrap()),
        (Grammar::HoursAgo, Regex::new(r"^([0-9０-９]+)時間前$").unwrap()),
        (Grammar::Hours, Regex::new(r"^([0-9０-９]+)時間$").unwrap()),
        (Grammar::Yesterday, Regex::new(r"^昨日$").unwrap()),
        (Grammar::Days, Regex::new(r"^([0-9０-９]+)日$").unwrap()),
        (
            Grammar::MonthDay,
            Regex::new(r"^([0-9０-９]{1,2})月([0-9０-９]{1,2})日$").unwrap(),
        ),
        (
            Grammar::YearMonthDay,
            Regex::new(r"^([0-9０-９]{4})年([0-9０-９]{1,2})月([0-9０-９]{1,2})日$").unwrap(),
        ),
        (
            Grammar::SlashDate,
            Regex::new(r"^([0-9０-９]{4})/([0-9０-９]{1,2})/([0-9０-９]{1,2})$").unwrap(),
        ),
    ]
});

/// A time token decoded into its grammar and numeric fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeToken {
    MinutesAgo(i64),
    HoursAgo(i64),
    Yesterday,
    DaysAgo(i64),
    MonthDay { month: u32, day: u32 },
    Date { year: i32, month: u32, day: u32 },
    SlashDate { year: i32, month: u32, day: u32 },
}

impl TimeToken {
    /// Decode a token, reporting why it could not be
    pub fn parse(token: &str) -> Result<Self, TimeParseError> {
        let token = token.trim();
        let (grammar, caps) = GRAMMARS
            .iter()
            .find_map(|(grammar, re)| re.captures(token).map(|caps| (*grammar, caps)))
            .ok_or_else(|| TimeParseError::Unrecognized(token.to_string()))?;

        let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

        Ok(match grammar {
            Grammar::MinutesAgo => Self::MinutesAgo(number(token, field(1))?),
            Grammar::HoursAgo | Grammar::Hours => Self::HoursAgo(number(token, field(1))?),
            Grammar::Yesterday => Self::Yesterday,
            Grammar::Days => Self::DaysAgo(number(token, field(1))?),
            Grammar::MonthDay => Self::MonthDay {
                month: number(token, field(1))?,
                day: number(token, field(2))?,
            },
            Grammar::YearMonthDay => Self::Date {
                year: number(token, field(1))?,
                month: number(token, field(2))?,
                day: number(token, field(3))?,
            },
            Grammar::SlashDate => Self::SlashDate {
                year: number(token, field(1))?,
                month: number(token, field(2))?,
                day: number(token, field(3))?,
            },
        })
    }
}

fn number<T: std::str::FromStr>(token: &str, digits: &str) -> Result<T, TimeParseError>
where
    T::Err: std::fmt::Display,
{
    ascii_digits(digits)
        .parse::<T>()
        .map_err(|e| TimeParseError::InvalidNumber {
            token: token.to_string(),
            reason: e.to_string(),
        })
}

/// Converts time tokens to UTC instants anchored at a capture-time `now`
#[derive(Debug, Clone, Copy)]
pub struct TimeExpressionResolver {
    local: FixedOffset,
}

impl TimeExpressionResolver {
    /// Resolver for a fixed local offset
    pub fn new(local: FixedOffset) -> Self {
        Self { local }
    }

    /// Resolver for a local offset given in whole hours
    pub fn from_offset_hours(hours: i32) -> Result<Self, TimeParseError> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| TimeParseError::OutOfRange(format!("UTC offset {hours}h")))
    }

    /// Japan Standard Time (UTC+9)
    pub fn jst() -> Self {
        Self::from_offset_hours(9).unwrap_or_else(|_| Self::new(Utc.fix()))
    }

    /// Whether a line matches one of the recognized token grammars
    pub fn is_time_token(line: &str) -> bool {
        GRAMMARS.iter().any(|(_, re)| re.is_match(line))
    }

    /// Resolve a token, falling back to `now` on any failure
    ///
    /// The result is truncated to whole seconds.
    pub fn resolve(&self, token: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.try_resolve(token, now) {
            Ok(dt) => dt,
            Err(e) => {
                tracing::warn!(token = %token, error = %e, "Time token unresolved, using capture time");
                truncate_to_seconds(now)
            }
        }
    }

    /// Resolve a token, reporting failures
    pub fn try_resolve(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, TimeParseError> {
        let parsed = TimeToken::parse(token)?;
        let now_local = now.with_timezone(&self.local);
        let out_of_range = || TimeParseError::OutOfRange(token.trim().to_string());

        let resolved = match parsed {
            TimeToken::MinutesAgo(n) => Duration::try_minutes(n)
                .and_then(|d| now.checked_sub_signed(d))
                .ok_or_else(out_of_range)?,
            TimeToken::HoursAgo(n) => Duration::try_hours(n)
                .and_then(|d| now.checked_sub_signed(d))
                .ok_or_else(out_of_range)?,
            TimeToken::DaysAgo(n) => Duration::try_days(n)
                .and_then(|d| now.checked_sub_signed(d))
                .ok_or_else(out_of_range)?,
            TimeToken::Yesterday => {
                let date = now_local
                    .date_naive()
                    .pred_opt()
                    .ok_or_else(out_of_range)?;
                self.local_noon(date).ok_or_else(out_of_range)?
            }
            TimeToken::MonthDay { month, day } => {
                let date = NaiveDate::from_ymd_opt(now_local.year(), month, day)
                    .ok_or_else(out_of_range)?;
                self.local_noon(date).ok_or_else(out_of_range)?
            }
            TimeToken::Date { year, month, day } => {
                let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(out_of_range)?;
                self.local_noon(date).ok_or_else(out_of_range)?
            }
            TimeToken::SlashDate { year, month, day } => NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .ok_or_else(out_of_range)?
                .and_utc(),
        };

        Ok(truncate_to_seconds(resolved))
    }

    fn local_noon(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let noon = date.and_hms_opt(12, 0, 0)?;
        self.local
            .from_local_datetime(&noon)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl Default for TimeExpressionResolver {
    fn default() -> Self {
        Self::jst()
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::format_iso;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn resolve(token: &str) -> String {
        format_iso(&TimeExpressionResolver::jst().resolve(token, now()))
    }

    #[test]
    fn test_hours_ago() {
        assert_eq!(resolve("3時間前"), "2025-01-01T09:00:00Z");
    }

    #[test]
    fn test_hours_without_suffix_matches_hours_ago() {
        assert_eq!(resolve("3時間"), resolve("3時間前"));
    }

    #[test]
    fn test_full_width_digits() {
        assert!(TimeExpressionResolver::is_time_token("３時間前"));
        assert_eq!(resolve("３時間前"), "2025-01-01T09:00:00Z");
        assert_eq!(resolve("１１月９日"), "2025-11-09T03:00:00Z");
        assert_eq!(resolve("２０２５/１/９"), "2025-01-09T00:00:00Z");
    }

    #[test]
    fn test_other_script_digits_are_not_tokens() {
        assert!(!TimeExpressionResolver::is_time_token("٣時間前"));
    }

    #[test]
    fn test_minutes_ago() {
        assert_eq!(resolve("45分前"), "2025-01-01T11:15:00Z");
    }

    #[test]
    fn test_days_ago_keeps_time_of_day() {
        assert_eq!(resolve("5日"), "2024-12-27T12:00:00Z");
    }

    #[test]
    fn test_yesterday_is_local_noon() {
        // 12:00Z is 21:00 JST on Jan 1, so yesterday is Dec 31 12:00 JST
        assert_eq!(resolve("昨日"), "2024-12-31T03:00:00Z");
    }

    #[test]
    fn test_month_day_uses_local_year() {
        assert_eq!(resolve("11月9日"), "2025-11-09T03:00:00Z");

        // 20:00Z on Dec 31 is already Jan 1 in JST
        let late = Utc.with_ymd_and_hms(2025, 12, 31, 20, 0, 0).unwrap();
        let dt = TimeExpressionResolver::jst().resolve("1月2日", late);
        assert_eq!(format_iso(&dt), "2026-01-02T03:00:00Z");
    }

    #[test]
    fn test_full_kanji_date() {
        assert_eq!(resolve("2024年11月9日"), "2024-11-09T03:00:00Z");
    }

    #[test]
    fn test_slash_date_is_utc_midnight() {
        assert_eq!(resolve("2025/11/09"), "2025-11-09T00:00:00Z");
        assert_eq!(resolve("2025/1/9"), "2025-01-09T00:00:00Z");
    }

    #[test]
    fn test_unrecognized_falls_back_to_now() {
        assert_eq!(resolve("たった今"), "2025-01-01T12:00:00Z");
        assert_eq!(resolve(""), "2025-01-01T12:00:00Z");
    }

    #[test]
    fn test_invalid_calendar_date_falls_back_to_now() {
        assert_eq!(resolve("2月30日"), "2025-01-01T12:00:00Z");
        assert_eq!(resolve("2025/13/01"), "2025-01-01T12:00:00Z");
    }

    #[test]
    fn test_overflowing_number_falls_back_to_now() {
        assert_eq!(resolve("99999999999999999999分前"), "2025-01-01T12:00:00Z");
        assert_eq!(resolve("9999999999999日"), "2025-01-01T12:00:00Z");
    }

    #[test]
    fn test_try_resolve_reports_reason() {
        let resolver = TimeExpressionResolver::jst();
        assert!(matches!(
            resolver.try_resolve("someday", now()),
            Err(TimeParseError::Unrecognized(_))
        ));
        assert!(matches!(
            resolver.try_resolve("2月30日", now()),
            Err(TimeParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_subseconds_are_dropped() {
        let jittery = now().with_nanosecond(123_456_789).unwrap();
        let dt = TimeExpressionResolver::jst().resolve("1分前", jittery);
        assert_eq!(dt.nanosecond(), 0);
        assert_eq!(format_iso(&dt), "2025-01-01T11:59:00Z");
    }

    #[test]
    fn test_is_time_token() {
        for token in ["1分前", "2時間前", "2時間", "昨日", "3日", "11月9日", "2024年1月2日", "2025/11/09"] {
            assert!(TimeExpressionResolver::is_time_token(token), "{token}");
        }
        for token in ["alice", "3", "いいね！5", "昨日の話", "2025-11-09"] {
            assert!(!TimeExpressionResolver::is_time_token(token), "{token}");
        }
    }

    #[test]
    fn test_custom_offset() {
        let utc = TimeExpressionResolver::from_offset_hours(0).unwrap();
        let dt = utc.resolve("2024年11月9日", now());
        assert_eq!(format_iso(&dt), "2024-11-09T12:00:00Z");
        assert!(TimeExpressionResolver::from_offset_hours(30).is_err());
    }
}
