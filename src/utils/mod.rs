//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use encoding_rs::SHIFT_JIS;

use self::error::DecodeError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode pasted input bytes to a UTF-8 string
///
/// UTF-8 (with or without BOM) is tried first; Windows clipboard dumps of
/// Japanese feeds are often Shift_JIS, which is the fallback.
pub fn decode_input(bytes: &[u8]) -> Result<String, DecodeError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    let (cow, _encoding, had_errors) = SHIFT_JIS.decode(bytes);

    if had_errors {
        return Err(DecodeError::UnknownEncoding {
            encoding: SHIFT_JIS.name(),
        });
    }

    Ok(cow.into_owned())
}

/// Split text into lines, accepting `\n`, `\r\n` and lone `\r`
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| line.split('\r'))
        .map(str::to_string)
        .collect()
}

/// Prefix of at most `max_chars` characters, never splitting a code point
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Map full-width digits and commas to their ASCII forms
pub fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            '，' => ',',
            _ => c,
        })
        .collect()
}
