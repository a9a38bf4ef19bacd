//! Command-line launch and app-info functionality.

use storekeep::app::Runtime;
use storekeep::logic::ActionOutcome;

use crate::args::utils;

/// What: Launch `id` through the host.
///
/// Output:
/// - `true` when the host opened the app.
pub async fn handle_open(runtime: &Runtime, id: &str) -> bool {
    let outcome = runtime.coordinator().open(id).await;
    report(runtime, id, &outcome, "opened")
}

/// What: Open the app-info page of `id`, where a disabled app can be re-enabled.
///
/// Output:
/// - `true` when the host opened the page.
pub async fn handle_app_info(runtime: &Runtime, id: &str) -> bool {
    let outcome = runtime.coordinator().open_app_info(id).await;
    report(runtime, id, &outcome, "app info opened")
}

/// Print the outcome of a launch-style action.
fn report(runtime: &Runtime, id: &str, outcome: &ActionOutcome, done: &str) -> bool {
    match outcome {
        ActionOutcome::Done => {
            println!("{id}: {done}");
            true
        }
        ActionOutcome::Rejected => {
            eprintln!("{id}: busy updating, try again when it finishes");
            false
        }
        _ => {
            utils::print_last_error(runtime.coordinator(), id, "could not be opened");
            false
        }
    }
}
