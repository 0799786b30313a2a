//! Text sanitization for pasted feed lines and assembled post bodies
//!
//! Clipboard copies of social feeds carry invisible characters (zero-width
//! joiners, BOMs, bidi marks) that break exact-match comparisons against the
//! account handle and time tokens, so every line goes through
//! [`normalize_line`] before segmentation.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::RawLine;

static BACKTICK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`+").unwrap());

static TRAILING_SPACE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+\n").unwrap());

/// Normalize a single pasted line
///
/// 1. Remove zero-width characters
/// 2. Remove control characters
/// 3. Map no-break spaces to plain spaces
/// 4. Trim
///
/// # Examples
///
/// ```
/// use threadsift::parser::sanitize::normalize_line;
///
/// assert_eq!(normalize_line("\u{FEFF} alice\u{200B} "), "alice");
/// ```
pub fn normalize_line(line: &str) -> String {
    let cleaned = remove_control_chars(&remove_zero_width(line));
    cleaned.replace('\u{00A0}', " ").trim().to_string()
}

/// Normalize every line and attach its position
pub fn to_raw_lines<S: AsRef<str>>(lines: &[S]) -> Vec<RawLine> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| RawLine::new(index, normalize_line(line.as_ref())))
        .collect()
}

/// Remove zero-width spaces and similar invisible characters
///
/// Removes:
/// - \u{200B}-\u{200F} zero-width space/joiners and directional marks
/// - \u{202A}-\u{202E} bidi embedding controls
/// - \u{2060} word joiner
/// - \u{FEFF} byte order mark
///
/// Line/paragraph separators (\u{2028}, \u{2029}) and the narrow no-break
/// space (\u{202F}) separate words, so they become a plain space.
///
/// # Examples
///
/// ```
/// use threadsift::parser::sanitize::remove_zero_width;
///
/// assert_eq!(remove_zero_width("い\u{200B}い\u{FEFF}ね"), "いいね");
/// assert_eq!(remove_zero_width("a\u{202F}b"), "a b");
/// ```
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}' | '\u{FEFF}' => None,
            '\u{2028}' | '\u{2029}' | '\u{202F}' => Some(' '),
            _ => Some(c),
        })
        .collect()
}

/// Remove control characters (a line has no newlines left to keep)
pub fn remove_control_chars(text: &str) -> String {
    text.chars().filter(|c| !c.is_control() || *c == '\t').collect()
}

/// Final cleanup of a joined post body
///
/// Strips backtick runs left by code-formatting in the feed UI and
/// whitespace dangling before line breaks, then trims the whole text.
///
/// # Examples
///
/// ```
/// use threadsift::parser::sanitize::clean_body;
///
/// assert_eq!(clean_body("``buy``  \nhold "), "buy\nhold");
/// ```
pub fn clean_body(text: &str) -> String {
    let without_ticks = BACKTICK_REGEX.replace_all(text, "");
    TRAILING_SPACE_REGEX
        .replace_all(&without_ticks, "\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_strips_invisible() {
        assert_eq!(normalize_line("\u{200E}3時間前\u{200F}"), "3時間前");
        assert_eq!(normalize_line("  いいね！\u{00A0}12  "), "いいね！ 12");
        assert_eq!(normalize_line("   "), "");
    }

    #[test]
    fn test_to_raw_lines_keeps_positions() {
        let lines = to_raw_lines(&["a", "  ", "b "]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].index, 1);
        assert!(lines[1].is_blank());
        assert_eq!(lines[2].text, "b");
    }

    #[test]
    fn test_separators_become_spaces() {
        assert_eq!(remove_zero_width("a\u{202F}b"), "a b");
        assert_eq!(remove_zero_width("上\u{2028}下\u{2029}末"), "上 下 末");
        assert_eq!(remove_zero_width("\u{202A}alice\u{202C}"), "alice");
        assert_eq!(normalize_line("\u{2028}押し目\u{202F}買い\u{2029}"), "押し目 買い");
    }

    #[test]
    fn test_remove_control_chars() {
        assert_eq!(remove_control_chars("a\x00b\x07c"), "abc");
    }

    #[test]
    fn test_clean_body() {
        assert_eq!(clean_body("line one   \nline two"), "line one\nline two");
        assert_eq!(clean_body("`code`"), "code");
        assert_eq!(clean_body("  \n  "), "");
    }
}
