//! Command-line install functionality.

use storekeep::app::Runtime;
use storekeep::install::{InstallError, InstallOutcome};
use storekeep::logic::{ActionOutcome, InstallTask};
use storekeep::state::{InstallStatus, RegistryEvent, StatusSubscription, SubscriptionError};

use crate::args::utils;

/// What: Install or update every package in `ids`.
///
/// Inputs:
/// - `runtime`: Shared components.
/// - `ids`: Package ids, already split and deduplicated.
/// - `assume_yes`: Skip confirmation prompts.
///
/// Output:
/// - `true` when every package ended up installed or needed nothing.
///
/// Details:
/// - Packages are installed one after another; progress is printed per percent.
pub async fn handle_install(runtime: &Runtime, ids: &[String], assume_yes: bool) -> bool {
    tracing::info!(count = ids.len(), "Install requested from CLI");
    let mut ok = true;
    for id in ids {
        ok &= install_one(runtime, id, assume_yes).await;
    }
    ok
}

/// Install a single package, following its progress until it finishes.
async fn install_one(runtime: &Runtime, id: &str, assume_yes: bool) -> bool {
    let coordinator = runtime.coordinator();
    let Some(status) = coordinator.resolve_status(id).await else {
        eprintln!("{id}: not found in the repository (try --refresh)");
        return false;
    };
    if let Some(err) = coordinator.take_error() {
        utils::print_error(id, &err);
        return false;
    }
    // Subscribe before starting so no event is missed
    let events = runtime.registry().subscribe_package(id);
    let outcome = match coordinator.install(id).await {
        ActionOutcome::AwaitingConfirmation(_) => {
            let verb = if status == InstallStatus::Updatable {
                "Update"
            } else {
                "Install"
            };
            if utils::confirm(&format!("{verb} {id}?"), assume_yes) {
                coordinator.confirm().await
            } else {
                coordinator.dismiss();
                println!("{id}: cancelled");
                return true;
            }
        }
        other => other,
    };
    match outcome {
        ActionOutcome::Started(task) => follow_install(id, task, events).await,
        ActionOutcome::Ignored => {
            println!("{id}: nothing to install ({})", runtime.registry().get(id));
            true
        }
        ActionOutcome::Done => true,
        ActionOutcome::Rejected | ActionOutcome::Failed | ActionOutcome::AwaitingConfirmation(_) => {
            utils::print_last_error(coordinator, id, "install not possible");
            false
        }
    }
}

/// What: Print progress events of `id` until `task` finishes.
///
/// Inputs:
/// - `id`: Package being installed.
/// - `task`: Running install.
/// - `events`: Registry subscription for `id`, opened before the install started.
///
/// Output:
/// - `true` when the package was installed (or another attempt owns the install).
async fn follow_install(id: &str, task: InstallTask, mut events: StatusSubscription) -> bool {
    let mut printer = ProgressPrinter::default();
    let mut wait = std::pin::pin!(task.wait());
    let mut subscribed = true;
    let result = loop {
        tokio::select! {
            result = &mut wait => break result,
            event = events.recv(), if subscribed => match event {
                Ok(event) => printer.print(id, &event),
                Err(SubscriptionError::Lagged(n)) => {
                    tracing::debug!(id = %id, skipped = n, "progress printer lagged");
                }
                Err(SubscriptionError::Closed) => subscribed = false,
            },
        }
    };
    for event in events.drain() {
        printer.print(id, &event);
    }
    report_result(id, result)
}

/// Print the final line of an install and return whether it succeeded.
fn report_result(id: &str, result: Option<Result<InstallOutcome, InstallError>>) -> bool {
    match result {
        Some(Ok(InstallOutcome::Installed { version_code })) => {
            println!("{id}: installed version code {version_code}");
            true
        }
        Some(Ok(InstallOutcome::AlreadyInProgress)) => {
            println!("{id}: install already in progress");
            true
        }
        Some(Err(err)) => {
            utils::print_error(id, &err);
            false
        }
        None => {
            eprintln!("{id}: install task stopped unexpectedly");
            false
        }
    }
}

/// Prints at most one progress line per whole percent.
#[derive(Default)]
struct ProgressPrinter {
    /// Last printed percentage.
    last_percent: Option<u64>,
}

impl ProgressPrinter {
    /// Print `event` when it carries something new.
    fn print(&mut self, id: &str, event: &RegistryEvent) {
        match event {
            RegistryEvent::Progress {
                progress: Some(progress),
                ..
            } => {
                let percent = progress.part.saturating_mul(100) / progress.total.max(1);
                if self.last_percent != Some(percent) {
                    self.last_percent = Some(percent);
                    println!("{id}: {progress} ({percent}%)");
                }
            }
            RegistryEvent::Status {
                status: InstallStatus::Loading,
                ..
            } => println!("{id}: preparing download"),
            RegistryEvent::Progress { progress: None, .. } | RegistryEvent::Status { .. } => {}
        }
    }
}
