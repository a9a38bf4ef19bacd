//! storekeep binary entrypoint kept minimal. The work lives in the library and `args`.

mod args;

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use clap::Parser;

struct StorekeepTimer;

impl tracing_subscriber::fmt::time::FormatTime for StorekeepTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let s = storekeep::util::now_utc_string(); // "YYYY-MM-DD HH:MM:SS"
        let ts = s.replacen(' ', "-T", 1); // "YYYY-MM-DD-T HH:MM:SS"
        w.write_str(&ts)
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// What: Initialize tracing, writing to `<config>/logs/storekeep.log`.
///
/// Inputs:
/// - `config_dir`: Resolved configuration directory.
/// - `level`: Filter used when `RUST_LOG` is not set.
///
/// Details:
/// - Falls back to stderr when the log file cannot be opened.
fn init_logging(config_dir: &Path, level: &str) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    let log_path = storekeep::config::logs_dir(config_dir).join("storekeep.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(StorekeepTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            // Fallback: init stderr logger to avoid blocking startup
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(StorekeepTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main]
async fn main() {
    let args = args::Args::parse();
    let config_dir = storekeep::config::config_dir(args.config_dir.as_deref());
    init_logging(&config_dir, &args::determine_log_level(&args));

    tracing::info!(config_dir = %config_dir.display(), "storekeep starting");
    let code = match args::process_args(&args, &config_dir).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            tracing::error!(error = ?err, "Application error");
            eprintln!("storekeep: {err}");
            2
        }
    };
    tracing::info!(code, "storekeep exited");
    std::process::exit(code);
}
