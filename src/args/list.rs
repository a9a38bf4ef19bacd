//! Command-line listing functionality.

use storekeep::app::Runtime;
use storekeep::logic::InstallActions;

/// What: Print every trusted app with its status and latest version.
///
/// Details:
/// - An empty list hints at `--refresh`; the trusted list is only filled by a refresh.
pub async fn handle_list(runtime: &Runtime) {
    let rows = runtime.app_rows().await;
    if rows.is_empty() {
        println!("No apps known yet. Run with --refresh to fetch repository data.");
        return;
    }
    let width = rows.iter().map(|r| r.app.id.len()).max().unwrap_or(0);
    for row in rows {
        println!(
            "{:<width$}  {:<11}  {:<10}  {}",
            row.app.id,
            row.status.label(),
            row.version.as_deref().unwrap_or("-"),
            row.app.name,
        );
    }
}

/// What: Print status and available actions of each package in `ids`.
///
/// Output:
/// - `false` when any id is unknown to the repository.
pub async fn handle_status(runtime: &Runtime, ids: &[String]) -> bool {
    let coordinator = runtime.coordinator();
    let mut ok = true;
    for id in ids {
        let Some(status) = coordinator.resolve_status(id).await else {
            eprintln!("{id}: not found in the repository (try --refresh)");
            ok = false;
            continue;
        };
        if let Some(err) = coordinator.take_error() {
            crate::args::utils::print_error(id, &err);
        }
        let release = coordinator.release_info(id);
        let min_sdk = release.as_ref().map_or(0, |r| r.min_sdk);
        let version = release.as_ref().map_or("-", |r| r.version.as_str());
        println!("{id}: {} (latest {version})", status.label());
        println!("  {}", describe_actions(&coordinator.actions(id, min_sdk)));
    }
    ok
}

/// One-line summary of what a screen would offer.
fn describe_actions(actions: &InstallActions) -> String {
    if let Some(message) = &actions.incompatible {
        return message.clone();
    }
    let mut parts = Vec::new();
    if let Some(primary) = actions.primary {
        if actions.primary_enabled {
            parts.push(primary.label().to_string());
        } else {
            parts.push(format!("{} (unavailable)", primary.label()));
        }
    }
    if actions.uninstall {
        parts.push("remove".to_string());
    }
    if let Some(progress) = actions.progress {
        parts.push(format!("downloading {progress}"));
    } else if actions.waiting_for_size {
        parts.push("waiting for download size".to_string());
    }
    if parts.is_empty() {
        "no actions".to_string()
    } else {
        format!("actions: {}", parts.join(", "))
    }
}
