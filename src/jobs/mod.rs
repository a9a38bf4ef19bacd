//! Background repository refresh and automatic update jobs.
//!
//! Jobs are plain async functions driven either once (CLI) or on a
//! `tokio::time::interval` by [`spawn_periodic`]. Each run first checks its
//! [`JobConstraints`] against a [`NetworkProbe`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::install::{InstallError, InstallOutcome};
use crate::logic::{ActionOutcome, InstallCoordinator};
use crate::state::InstallStatus;

mod network;

pub use network::{NetworkProbe, NetworkState, NetworkType, ParseNetworkTypeError, StaticNetwork};

/// Background job flavours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Refresh the trusted app list and every status.
    RepositoryRefresh,
    /// Refresh, then install every available update.
    AutoUpdate,
}

/// Conditions a job needs before it runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JobConstraints {
    /// Required network.
    pub network: NetworkType,
}

/// Settings forwarded to every job run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JobSettings {
    /// Run constraints.
    pub constraints: JobConstraints,
    /// Whether the user enabled automatic updates.
    pub automatic_updates: bool,
}

/// Why a run did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The network does not satisfy the constraint.
    NetworkConstraint(NetworkType),
    /// Automatic updates are turned off.
    AutomaticUpdatesDisabled,
}

/// Per-package results of an auto-update run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Packages updated.
    pub updated: Vec<String>,
    /// Packages left alone because they need confirmation.
    pub skipped: Vec<String>,
    /// Packages whose update failed.
    pub failed: Vec<(String, InstallError)>,
}

/// Outcome of one job run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobReport {
    /// Nothing ran.
    Skipped(SkipReason),
    /// The repository refresh succeeded.
    Refreshed,
    /// The auto-update pass ran.
    Updated(UpdateSummary),
    /// The repository refresh failed.
    Failed(InstallError),
}

/// What: Run one job now.
///
/// Inputs:
/// - `kind`: Job to run
/// - `coordinator`: Coordinator used for refreshes and installs
/// - `settings`: Constraints and preferences
/// - `probe`: Current network state
///
/// Output:
/// - What happened, for logging or display.
///
/// Details:
/// - Auto-update installs without confirmation only while the coordinator does
///   not require it; otherwise every update is skipped and logged.
pub async fn run_job(
    kind: JobKind,
    coordinator: &InstallCoordinator,
    settings: JobSettings,
    probe: &dyn NetworkProbe,
) -> JobReport {
    let network = settings.constraints.network;
    if !network.allows(probe.current()) {
        info!(?kind, network = %network, "job skipped: network constraint not met");
        return JobReport::Skipped(SkipReason::NetworkConstraint(network));
    }
    if kind == JobKind::AutoUpdate && !settings.automatic_updates {
        debug!("auto-update skipped: disabled by preference");
        return JobReport::Skipped(SkipReason::AutomaticUpdatesDisabled);
    }
    if let ActionOutcome::Failed = coordinator.refresh_repo_data().await {
        let err = coordinator.take_error().unwrap_or_else(|| {
            InstallError::NetworkUnreachable("repository refresh failed".to_string())
        });
        warn!(?kind, error = %err, "job failed");
        return JobReport::Failed(err);
    }
    match kind {
        JobKind::RepositoryRefresh => JobReport::Refreshed,
        JobKind::AutoUpdate => JobReport::Updated(update_all(coordinator).await),
    }
}

/// Install every `Updatable` package, one after another.
async fn update_all(coordinator: &InstallCoordinator) -> UpdateSummary {
    let mut summary = UpdateSummary::default();
    let updatable: Vec<String> = coordinator
        .registry()
        .snapshot()
        .into_iter()
        .filter(|(_, status)| *status == InstallStatus::Updatable)
        .map(|(id, _)| id)
        .collect();
    for id in updatable {
        if coordinator.requires_confirmation() {
            info!(id = %id, "auto-update skipped: confirmation required");
            summary.skipped.push(id);
            continue;
        }
        match coordinator.install(&id).await {
            ActionOutcome::Started(task) => match task.wait().await {
                Some(Ok(InstallOutcome::Installed { version_code })) => {
                    info!(id = %id, version_code, "auto-updated");
                    summary.updated.push(id);
                }
                Some(Ok(InstallOutcome::AlreadyInProgress)) => {
                    debug!(id = %id, "update already running elsewhere");
                }
                Some(Err(e)) => summary.failed.push((id, e)),
                None => summary.failed.push((
                    id,
                    InstallError::MalformedPackage("update task aborted".to_string()),
                )),
            },
            ActionOutcome::AwaitingConfirmation(_) => {
                coordinator.dismiss();
                summary.skipped.push(id);
            }
            ActionOutcome::Rejected | ActionOutcome::Failed => {
                if let Some(e) = coordinator.take_error() {
                    summary.failed.push((id, e));
                }
            }
            ActionOutcome::Done | ActionOutcome::Ignored => {}
        }
    }
    summary
}

/// What: Run a job every `period`, sending each report to `reports`.
///
/// Inputs:
/// - `kind`, `coordinator`, `settings`, `probe`: As for [`run_job`]
/// - `period`: Time between runs
/// - `reports`: Receives `(kind, report)` after every run
///
/// Output:
/// - Handle of the spawned task; abort it to stop the schedule.
///
/// Details:
/// - The first run happens after one full period, not at startup.
/// - The loop ends once the report receiver is dropped.
pub fn spawn_periodic(
    kind: JobKind,
    coordinator: Arc<InstallCoordinator>,
    settings: JobSettings,
    probe: Arc<dyn NetworkProbe>,
    period: Duration,
    reports: mpsc::UnboundedSender<(JobKind, JobReport)>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // Skip the immediate first tick
        interval.tick().await;
        loop {
            interval.tick().await;
            let report = run_job(kind, &coordinator, settings, probe.as_ref()).await;
            if reports.send((kind, report)).is_err() {
                debug!(?kind, "job report receiver dropped; stopping schedule");
                break;
            }
        }
    })
}
