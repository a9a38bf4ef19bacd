//! Command-line watch mode: background jobs until interrupted.

use std::sync::Arc;

use storekeep::app::{Runtime, spawn_background_jobs};
use storekeep::jobs::StaticNetwork;

use crate::args::refresh::print_report;

/// What: Run the background jobs on their schedule until Ctrl+C.
///
/// Details:
/// - The network is treated as connected and unmetered.
/// - Every report is printed as it arrives.
pub async fn handle_watch(runtime: &Runtime) {
    let (handles, mut reports) =
        spawn_background_jobs(runtime, Arc::new(StaticNetwork::unmetered()));
    println!(
        "Watching; next run in {} h (Ctrl+C to stop)",
        runtime.job_period().as_secs() / 3600
    );
    loop {
        tokio::select! {
            report = reports.recv() => match report {
                Some((kind, report)) => {
                    print_report(kind, &report);
                }
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    tracing::warn!(error = %e, "failed to listen for Ctrl+C");
                }
                tracing::info!("Received Ctrl+C signal");
                break;
            }
        }
    }
    for handle in handles {
        handle.abort();
    }
}
