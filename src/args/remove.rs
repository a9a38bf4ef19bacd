//! Command-line remove functionality.

use storekeep::app::Runtime;
use storekeep::logic::ActionOutcome;

use crate::args::utils;

/// What: Uninstall every package in `ids`.
///
/// Inputs:
/// - `runtime`: Shared components.
/// - `ids`: Package ids.
/// - `assume_yes`: Skip confirmation prompts.
///
/// Output:
/// - `true` when every package was removed or was not installed.
///
/// Details:
/// - The client's own package is always refused.
/// - Each removal is recorded in `remove_log.log` by the installer.
pub async fn handle_remove(runtime: &Runtime, ids: &[String], assume_yes: bool) -> bool {
    tracing::info!(count = ids.len(), "Remove requested from CLI");
    let coordinator = runtime.coordinator();
    let mut ok = true;
    for id in ids {
        if coordinator.resolve_status(id).await.is_none() {
            // Not in the repository; the host may still know it
            tracing::debug!(id = %id, "removing package unknown to the repository");
        }
        let outcome = match coordinator.uninstall(id).await {
            ActionOutcome::AwaitingConfirmation(_) => {
                if utils::confirm(&format!("Remove {id}?"), assume_yes) {
                    coordinator.confirm().await
                } else {
                    coordinator.dismiss();
                    println!("{id}: cancelled");
                    continue;
                }
            }
            other => other,
        };
        match outcome {
            ActionOutcome::Done => println!("{id}: removed"),
            ActionOutcome::Ignored => println!("{id}: not installed"),
            ActionOutcome::Rejected => {
                eprintln!("{id}: the running client cannot remove itself");
                ok = false;
            }
            ActionOutcome::Failed
            | ActionOutcome::Started(_)
            | ActionOutcome::AwaitingConfirmation(_) => {
                utils::print_last_error(coordinator, id, "remove failed");
                ok = false;
            }
        }
    }
    ok
}
