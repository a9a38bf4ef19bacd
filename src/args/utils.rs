//! Shared utilities for argument processing.

use storekeep::install::InstallError;
use storekeep::logic::InstallCoordinator;

/// What: Determine the log level based on command-line arguments.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Verbose flag overrides `log_level` argument.
pub fn determine_log_level(args: &crate::args::Args) -> String {
    if args.verbose {
        "debug".to_string()
    } else {
        args.log_level.clone()
    }
}

/// What: Parse package ids from input, handling both comma-separated and space-separated formats.
///
/// Inputs:
/// - `packages`: Vector of package strings (may contain comma-separated values).
///
/// Output:
/// - Vector of individual package ids, duplicates removed in first-seen order.
///
/// Details:
/// - Splits each input string by commas and trims whitespace.
/// - Filters out empty strings.
pub fn parse_package_names(packages: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for pkg in packages {
        for name in pkg.split(',') {
            let trimmed = name.trim();
            if !trimmed.is_empty() && !result.iter().any(|r| r == trimmed) {
                result.push(trimmed.to_string());
            }
        }
    }
    result
}

/// What: Prompt the user for yes/no confirmation with "No" as default.
///
/// Inputs:
/// - `message`: The prompt message to display.
///
/// Output:
/// - `true` if user explicitly confirms (y/Y/yes), `false` otherwise (default).
///
/// Details:
/// - Reads a single line from stdin.
/// - Defaults to "no" (empty input, Enter key or read error).
pub fn prompt_user_no_default(message: &str) -> bool {
    use std::io::{self, Write};

    print!("{message} [y/N]: ");
    io::stdout().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        let trimmed = input.trim();
        trimmed.eq_ignore_ascii_case("y") || trimmed.eq_ignore_ascii_case("yes")
    } else {
        false
    }
}

/// Confirm `message`, skipping the prompt when `assume_yes` is set.
pub fn confirm(message: &str, assume_yes: bool) -> bool {
    assume_yes || prompt_user_no_default(message)
}

/// Print the user-facing message of `err` for `id` to stderr.
pub fn print_error(id: &str, err: &InstallError) {
    eprintln!("{id}: {}", err.user_message());
}

/// What: Print the coordinator's last error for `id`, or `fallback` when the slot is empty.
///
/// Inputs:
/// - `coordinator`: Coordinator whose error slot is drained.
/// - `id`: Package the failed action targeted.
/// - `fallback`: Message used when no error was recorded.
pub fn print_last_error(coordinator: &InstallCoordinator, id: &str, fallback: &str) {
    match coordinator.take_error() {
        Some(err) => print_error(id, &err),
        None => eprintln!("{id}: {fallback}"),
    }
}
