//! Configuration file parsing utilities.
//!
//! This module provides helpers for parsing configuration files with common
//! patterns like comment skipping and key-value parsing.

/// What: Check if a line should be skipped (empty or comment).
///
/// Inputs:
/// - `line`: Line to check
///
/// Output:
/// - `true` if the line should be skipped, `false` otherwise
///
/// Details:
/// - Skips empty lines and lines starting with `#`, `//`, or `;`
#[must_use]
pub fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// What: Parse a key-value pair from a line.
///
/// Inputs:
/// - `line`: Line containing key=value format
///
/// Output:
/// - `Some((key, value))` if parsing succeeds, `None` otherwise
///
/// Details:
/// - Splits on the first `=` character
/// - The key is normalized with [`normalize_key`]
/// - Inline comments are stripped from the value
#[must_use]
pub fn parse_key_value(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    let (raw_key, raw_val) = trimmed.split_once('=')?;
    let key = normalize_key(raw_key);
    if key.is_empty() {
        return None;
    }
    Some((key, strip_inline_comment(raw_val).to_string()))
}

/// Lowercase a key and fold `.`, `-` and spaces into `_`.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['.', '-', ' '], "_")
}

/// What: Strip a trailing `// …` or `# …` comment from a value.
///
/// Details:
/// - A marker only starts a comment at the beginning of the value or after
///   whitespace, so `https://host/#frag` survives intact.
#[must_use]
pub fn strip_inline_comment(s: &str) -> &str {
    let bytes = s.as_bytes();
    let cut = s
        .char_indices()
        .find(|&(i, c)| {
            let at_boundary = i == 0 || bytes[i - 1].is_ascii_whitespace();
            at_boundary && (c == '#' || s[i..].starts_with("//"))
        })
        .map_or(s.len(), |(i, _)| i);
    s[..cut].trim()
}

/// What: Parse a boolean config value.
///
/// Inputs:
/// - `val`: Raw value text
///
/// Output:
/// - `Some(bool)` for `true/false`, `yes/no`, `on/off`, `1/0`; `None` otherwise.
#[must_use]
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
