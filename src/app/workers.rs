use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::init::Runtime;
use crate::jobs::{JobKind, JobReport, NetworkProbe, spawn_periodic};

/// Jobs kept on a schedule while the client runs in the background.
pub const BACKGROUND_JOBS: [JobKind; 2] = [JobKind::RepositoryRefresh, JobKind::AutoUpdate];

/// What: Schedule every background job for `runtime`.
///
/// Inputs:
/// - `runtime`: Shared components and preferences
/// - `probe`: Network state source
///
/// Output:
/// - One task handle per job and a shared receiver of `(kind, report)` pairs.
///
/// Details:
/// - Both jobs run every `auto_update_interval_hours`, starting one period from now.
/// - Auto-update reports itself skipped while the preference is off.
pub fn spawn_background_jobs(
    runtime: &Runtime,
    probe: Arc<dyn NetworkProbe>,
) -> (Vec<JoinHandle<()>>, mpsc::UnboundedReceiver<(JobKind, JobReport)>) {
    let period = runtime.job_period();
    let (tx, rx) = mpsc::unbounded_channel();
    let handles = BACKGROUND_JOBS
        .into_iter()
        .map(|kind| {
            info!(?kind, period_secs = period.as_secs(), "scheduling background job");
            spawn_periodic(
                kind,
                Arc::clone(runtime.coordinator()),
                runtime.job_settings(),
                Arc::clone(&probe),
                period,
                tx.clone(),
            )
        })
        .collect();
    (handles, rx)
}
