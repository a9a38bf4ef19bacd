use std::fs;
use std::path::Path;

use super::skeleton::SETTINGS_SKELETON_CONTENT;
use crate::util::config::{normalize_key, skip_comment_or_empty};

/// What: Persist a boolean key to `settings.conf`, preserving other content.
///
/// Inputs:
/// - `path`: Settings file
/// - `key_norm`: Normalized key (e.g. `automatic_updates`)
/// - `value`: New value
///
/// Output:
/// - `Ok(())` once written.
///
/// # Errors
/// - Returns `Err` when the directory or file cannot be written.
///
/// Details:
/// - Every line carrying the key is rewritten in place; comments stay untouched.
/// - A missing or empty file is seeded from the skeleton first.
pub fn save_boolean_key(path: &Path, key_norm: &str, value: bool) -> std::io::Result<()> {
    save_key(path, key_norm, if value { "true" } else { "false" })
}

/// What: Persist a string key to `settings.conf`, preserving other content.
///
/// # Errors
/// - Returns `Err` when the directory or file cannot be written.
pub fn save_string_key(path: &Path, key_norm: &str, value: &str) -> std::io::Result<()> {
    save_key(path, key_norm, value)
}

/// Shared rewrite used by the typed savers.
fn save_key(path: &Path, key_norm: &str, value: &str) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let existing = fs::read_to_string(path).unwrap_or_default();
    let mut lines: Vec<String> = if existing.trim().is_empty() {
        SETTINGS_SKELETON_CONTENT.lines().map(str::to_string).collect()
    } else {
        existing.lines().map(str::to_string).collect()
    };
    let mut replaced = false;
    for line in &mut lines {
        if skip_comment_or_empty(line) {
            continue;
        }
        if let Some((kraw, _)) = line.split_once('=')
            && normalize_key(kraw) == key_norm
        {
            *line = format!("{key_norm} = {value}");
            replaced = true;
        }
    }
    if !replaced {
        lines.push(format!("{key_norm} = {value}"));
    }
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content)
}
