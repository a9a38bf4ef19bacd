//! Small utility helpers for progress and time formatting.
//!
//! Config-file line parsing lives in [`config`].

pub mod config;

/// Bytes per displayed megabyte.
const BYTES_PER_MB: f64 = 1_000_000.0;

/// What: Render a download progress pair as megabytes.
///
/// Inputs:
/// - `part`: Bytes fetched so far
/// - `total`: Expected total size in bytes
///
/// Output:
/// - `"{part} MB / {total} MB"` with one decimal place each.
///
/// Details:
/// - Uses decimal megabytes (1 MB = 1 000 000 bytes), matching download sizes
///   shown by the repository.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_progress_mb(part: u64, total: u64) -> String {
    let part_mb = part as f64 / BYTES_PER_MB;
    let total_mb = total as f64 / BYTES_PER_MB;
    format!("{part_mb:.1} MB / {total_mb:.1} MB")
}

/// What: Convert an optional Unix timestamp (seconds) to a UTC date-time string.
///
/// Inputs:
/// - `ts`: Optional Unix timestamp in seconds since epoch.
///
/// Output:
/// - `YYYY-MM-DD HH:MM:SS` (UTC), an empty string for `None`, or the numeric
///   string when the timestamp is out of range.
#[must_use]
pub fn ts_to_date(ts: Option<i64>) -> String {
    let Some(t) = ts else {
        return String::new();
    };
    if t < 0 {
        return t.to_string();
    }
    chrono::DateTime::from_timestamp(t, 0).map_or_else(
        || t.to_string(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Current UTC time formatted by [`ts_to_date`].
#[must_use]
pub fn now_utc_string() -> String {
    ts_to_date(Some(chrono::Utc::now().timestamp()))
}
