use std::io::Write;
use std::path::Path;

/// What: Append an installed package to the install audit log.
///
/// Input: `logs_dir` directory holding the audit logs; `id` and `version_code` of the install.
///
/// Output: `Ok(())` on success; otherwise an I/O error.
///
/// Details: Writes to `logs_dir/install_log.log`, prefixing the line with a UTC timestamp.
pub fn log_installed(logs_dir: &Path, id: &str, version_code: u64) -> std::io::Result<()> {
    append(
        logs_dir,
        "install_log.log",
        &format!("{} {id} {version_code}", crate::util::now_utc_string()),
    )
}

/// What: Append a removed package to the removal audit log.
///
/// Input:
/// - `logs_dir` directory holding the audit logs; `id` of the removed package.
///
/// Output:
/// - `Ok(())` on success; otherwise an I/O error.
///
/// # Errors
/// - Returns `Err` when the logs directory cannot be created
/// - Returns `Err` when the log file cannot be opened or written to
pub fn log_removed(logs_dir: &Path, id: &str) -> std::io::Result<()> {
    append(
        logs_dir,
        "remove_log.log",
        &format!("{} {id}", crate::util::now_utc_string()),
    )
}

/// Append one line to `logs_dir/file`, creating both as needed.
fn append(logs_dir: &Path, file: &str, line: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(logs_dir)?;
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(logs_dir.join(file))?;
    writeln!(f, "{line}")
}
