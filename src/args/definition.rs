//! Command-line argument definition and processing.

use std::path::PathBuf;

use clap::Parser;
use storekeep::app::Runtime;
use storekeep::config;

/// storekeep - install and update apps from a storekeep repository
#[derive(Parser, Debug)]
#[command(name = "storekeep")]
#[command(version)]
#[command(about = "Install and update apps from a storekeep repository", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Args {
    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Specify the configuration directory (default: ~/.config/storekeep)
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Use this repository (URL or mirror directory) instead of `repository_url`
    #[arg(long, value_name = "URL|PATH")]
    pub repo: Option<String>,

    /// List every app in the repository with its install status
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Show status and available actions of packages (e.g., storekeep --status ID1 ID2)
    #[arg(long, num_args = 1.., value_name = "ID")]
    pub status: Vec<String>,

    /// Install or update packages (comma-separated or space-separated)
    #[arg(short, long, num_args = 1.., value_name = "ID")]
    pub install: Vec<String>,

    /// Remove packages (e.g., storekeep -r ID1 ID2 or storekeep --remove ID)
    #[arg(short = 'r', long, num_args = 1.., value_name = "ID")]
    pub remove: Vec<String>,

    /// Launch an installed app
    #[arg(long, value_name = "ID")]
    pub open: Option<String>,

    /// Open the app-info page of an installed app
    #[arg(long, value_name = "ID")]
    pub app_info: Option<String>,

    /// Refresh repository data before anything else
    #[arg(short = 'y', long)]
    pub refresh: bool,

    /// Refresh and install every available update now
    #[arg(long)]
    pub auto_update: bool,

    /// Keep running and execute the background job every update interval
    #[arg(long)]
    pub watch: bool,

    /// Persist the automatic updates preference (true/false)
    #[arg(long, value_name = "BOOL", value_parser = clap::builder::BoolishValueParser::new())]
    pub set_automatic_updates: Option<bool>,

    /// Answer yes to every confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

impl Args {
    /// Whether any action flag was given.
    const fn has_action(&self) -> bool {
        self.list
            || !self.status.is_empty()
            || !self.install.is_empty()
            || !self.remove.is_empty()
            || self.open.is_some()
            || self.app_info.is_some()
            || self.refresh
            || self.auto_update
            || self.watch
            || self.set_automatic_updates.is_some()
    }
}

/// What: Process all command-line arguments in order.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
/// - `config_dir`: Resolved configuration directory.
///
/// Output:
/// - `Ok(true)` when every requested action succeeded, `Ok(false)` when any failed.
///
/// # Errors
/// - Returns `Err` when the runtime cannot be set up (settings or repository).
///
/// Details:
/// - Preference changes are saved before settings are loaded so they apply to this run.
/// - Order: refresh, auto-update, install, remove, open, app info, status, list, watch.
/// - Without any action flag the app list is printed.
pub async fn process_args(
    args: &Args,
    config_dir: &std::path::Path,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    use crate::args::{install, launch, list, refresh, remove, utils, watch};

    let mut ok = true;

    if let Some(enabled) = args.set_automatic_updates {
        let path = config::settings_path(config_dir);
        // Make sure the skeleton exists so the key lands in a commented file
        let _ = config::load_settings(&path);
        config::save_boolean_key(&path, "automatic_updates", enabled)?;
        println!("automatic_updates = {enabled} ({})", path.display());
    }

    let runtime = Runtime::init(config_dir, args.repo.as_deref())?;

    if args.refresh {
        ok &= refresh::handle_refresh(&runtime).await;
    }
    if args.auto_update {
        ok &= refresh::handle_auto_update(&runtime).await;
    }
    if !args.install.is_empty() {
        let ids = utils::parse_package_names(&args.install);
        ok &= install::handle_install(&runtime, &ids, args.yes).await;
    }
    if !args.remove.is_empty() {
        let ids = utils::parse_package_names(&args.remove);
        ok &= remove::handle_remove(&runtime, &ids, args.yes).await;
    }
    if let Some(id) = &args.open {
        ok &= launch::handle_open(&runtime, id).await;
    }
    if let Some(id) = &args.app_info {
        ok &= launch::handle_app_info(&runtime, id).await;
    }
    if !args.status.is_empty() {
        let ids = utils::parse_package_names(&args.status);
        ok &= list::handle_status(&runtime, &ids).await;
    }
    if args.list || !args.has_action() {
        list::handle_list(&runtime).await;
    }
    if args.watch {
        watch::handle_watch(&runtime).await;
    }
    Ok(ok)
}
