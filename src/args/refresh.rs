//! Command-line refresh and auto-update functionality.

use storekeep::app::Runtime;
use storekeep::jobs::{self, JobKind, JobReport, JobSettings, SkipReason, StaticNetwork};
use storekeep::logic::ActionOutcome;

use crate::args::utils;

/// What: Refresh the trusted app list and every status.
///
/// Output:
/// - `true` on success; the failure message is printed otherwise.
pub async fn handle_refresh(runtime: &Runtime) -> bool {
    tracing::info!("Repository refresh requested from CLI");
    let coordinator = runtime.coordinator();
    match coordinator.refresh_repo_data().await {
        ActionOutcome::Done => {
            let count = coordinator.registry().snapshot().len();
            println!("Repository data refreshed ({count} apps)");
            true
        }
        _ => {
            utils::print_last_error(coordinator, "repository", "refresh failed");
            false
        }
    }
}

/// What: Run one auto-update pass now.
///
/// Output:
/// - `true` when the refresh succeeded and no update failed.
///
/// Details:
/// - Asking explicitly overrides the `automatic_updates` preference, but
///   packages needing confirmation are still skipped.
pub async fn handle_auto_update(runtime: &Runtime) -> bool {
    tracing::info!("Auto-update requested from CLI");
    let settings = JobSettings {
        automatic_updates: true,
        ..runtime.job_settings()
    };
    let report = jobs::run_job(
        JobKind::AutoUpdate,
        runtime.coordinator(),
        settings,
        &StaticNetwork::unmetered(),
    )
    .await;
    print_report(JobKind::AutoUpdate, &report)
}

/// What: Print a job report.
///
/// Output:
/// - `false` when the report contains a failure.
pub fn print_report(kind: JobKind, report: &JobReport) -> bool {
    let name = match kind {
        JobKind::RepositoryRefresh => "refresh",
        JobKind::AutoUpdate => "auto-update",
    };
    match report {
        JobReport::Skipped(SkipReason::NetworkConstraint(network)) => {
            println!("[{name}] skipped: network does not satisfy '{network}'");
            true
        }
        JobReport::Skipped(SkipReason::AutomaticUpdatesDisabled) => {
            println!("[{name}] skipped: automatic updates are off");
            true
        }
        JobReport::Refreshed => {
            println!("[{name}] repository data refreshed");
            true
        }
        JobReport::Failed(err) => {
            eprintln!("[{name}] {}", err.user_message());
            false
        }
        JobReport::Updated(summary) => {
            if summary.updated.is_empty()
                && summary.skipped.is_empty()
                && summary.failed.is_empty()
            {
                println!("[{name}] everything is up to date");
            }
            for id in &summary.updated {
                println!("[{name}] {id}: updated");
            }
            for id in &summary.skipped {
                println!("[{name}] {id}: update needs confirmation, run --install {id}");
            }
            for (id, err) in &summary.failed {
                eprintln!("[{name}] {id}: {}", err.user_message());
            }
            summary.failed.is_empty()
        }
    }
}
