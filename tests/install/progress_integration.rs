//! Integration tests for progress and status events during an install.

#![cfg(test)]

use storekeep::logic::ActionOutcome;
use storekeep::state::{DownloadProgress, InstallStatus, RegistryEvent};

use crate::common::{Fixture, package_bytes};

#[tokio::test]
/// What: Subscribers see Loading, strictly increasing progress up to the total, then Installed.
///
/// Inputs:
/// - Release of two files served from the mirror.
///
/// Output:
/// - Event order `Status(Loading)`, progress from `(0, total)` to
///   `(total, total)` without repeats, progress cleared, `Status(Installed)`.
async fn progress_events_are_ordered_and_monotonic() {
    let fx = Fixture::new();
    let base = package_bytes("base");
    let split = package_bytes("split");
    fx.publish(
        "org.example.p",
        3,
        21,
        &[("base.apk", base.as_slice()), ("split.apk", split.as_slice())],
    );
    let total = (base.len() + split.len()) as u64;
    let rt = fx.refreshed_runtime().await;
    let mut events = rt.registry().subscribe_package("org.example.p");

    let ActionOutcome::Started(task) = rt.coordinator().install("org.example.p").await else {
        panic!("install should start");
    };
    assert!(task.wait().await.expect("finished").is_ok());

    let events = events.drain();
    assert_eq!(
        events.first(),
        Some(&RegistryEvent::Status {
            id: "org.example.p".to_string(),
            status: InstallStatus::Loading,
        })
    );
    assert_eq!(
        events.last(),
        Some(&RegistryEvent::Status {
            id: "org.example.p".to_string(),
            status: InstallStatus::Installed,
        })
    );
    let progress: Vec<DownloadProgress> = events
        .iter()
        .filter_map(|e| match e {
            RegistryEvent::Progress {
                progress: Some(p), ..
            } => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress.first(), Some(&DownloadProgress::new(0, total)));
    assert_eq!(progress.last(), Some(&DownloadProgress::new(total, total)));
    assert!(progress.windows(2).all(|w| w[0].part < w[1].part), "{progress:?}");
    assert!(progress.iter().all(|p| p.total == total));
    assert!(events.contains(&RegistryEvent::Progress {
        id: "org.example.p".to_string(),
        progress: None,
    }));
}

#[tokio::test]
/// What: The status snapshot lists every refreshed app in id order.
async fn snapshot_after_refresh_is_sorted() {
    let fx = Fixture::new();
    let bytes = package_bytes("z");
    fx.publish("org.example.zeta", 1, 21, &[("base.apk", bytes.as_slice())]);
    fx.publish("org.example.alpha", 1, 21, &[("base.apk", bytes.as_slice())]);
    let rt = fx.refreshed_runtime().await;
    let ids: Vec<String> = rt.registry().snapshot().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["org.example.alpha", "org.example.zeta"]);
}
