//! Integration tests for install policy and failure handling.
//!
//! Tests cover:
//! - SDK gate before any download
//! - Confirmation in privileged mode
//! - Device policy restrictions
//! - Tampered artifacts restoring the previous status

#![cfg(test)]

use storekeep::install::ErrorKind;
use storekeep::logic::{ActionOutcome, PendingAction};
use storekeep::state::{ArtifactFile, ArtifactVariant, InstallStatus, RemoteAppInfo};

use crate::common::{Fixture, package_bytes, read_log};

#[tokio::test]
/// What: A release needing a newer SDK is refused before anything is fetched.
///
/// Inputs:
/// - Package X with min SDK 40; device SDK 34.
///
/// Output:
/// - `Rejected`, "doesn't support your device" message, status still
///   `Installable`, nothing installed or logged.
async fn sdk_gate_rejects_before_download() {
    let fx = Fixture::new();
    let bytes = package_bytes("x");
    fx.publish("org.example.x", 5, 40, &[("base.apk", bytes.as_slice())]);
    let rt = fx.refreshed_runtime().await;
    let coordinator = rt.coordinator();

    let actions = coordinator.actions("org.example.x", 40);
    assert!(actions.incompatible.is_some());
    assert_eq!(actions.primary, None);

    assert!(matches!(coordinator.install("org.example.x").await, ActionOutcome::Rejected));
    let err = coordinator.take_error().expect("error recorded");
    assert_eq!(err.kind(), ErrorKind::UnsupportedDevice);
    assert!(
        err.user_message().starts_with("This app doesn't support your device: "),
        "{err}"
    );
    assert_eq!(rt.registry().get("org.example.x"), InstallStatus::Installable);
    assert!(!fx.installed_file("org.example.x", "base.apk").exists());
    assert!(read_log(&fx.logs_dir().join("install_log.log")).is_empty());
}

#[tokio::test]
/// What: Privileged installs wait for confirmation; dismissing leaves everything as is.
///
/// Inputs:
/// - `privileged_installer = true`, `require_user_action = true`.
///
/// Output:
/// - `AwaitingConfirmation`; dismiss keeps `Installable`; confirm installs.
async fn privileged_install_waits_for_confirmation() {
    let fx = Fixture::new();
    let bytes = package_bytes("p");
    fx.publish("org.example.p", 1, 21, &[("base.apk", bytes.as_slice())]);
    let mut settings = fx.settings();
    settings.privileged_installer = true;
    let rt = fx.runtime(settings);
    let coordinator = rt.coordinator();
    coordinator.refresh_repo_data().await;

    let outcome = coordinator.install("org.example.p").await;
    let ActionOutcome::AwaitingConfirmation(action) = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert_eq!(
        action,
        PendingAction::Install {
            id: "org.example.p".to_string()
        }
    );
    assert_eq!(coordinator.dismiss(), Some(action));
    assert_eq!(rt.registry().get("org.example.p"), InstallStatus::Installable);

    coordinator.install("org.example.p").await;
    let ActionOutcome::Started(task) = coordinator.confirm().await else {
        panic!("confirm should start the install");
    };
    assert!(task.wait().await.expect("finished").is_ok());
    assert_eq!(rt.registry().get("org.example.p"), InstallStatus::Installed);
}

#[tokio::test]
/// What: A device policy forbidding installs fails the task and restores the status.
///
/// Inputs:
/// - `disallow_install = true`.
///
/// Output:
/// - Task error `PolicyRestricted`; status back to `Installable`; no progress entry.
async fn install_policy_restriction_restores_status() {
    let fx = Fixture::new();
    let bytes = package_bytes("r");
    fx.publish("org.example.r", 1, 21, &[("base.apk", bytes.as_slice())]);
    let mut settings = fx.settings();
    settings.disallow_install = true;
    let rt = fx.runtime(settings);
    let coordinator = rt.coordinator();
    coordinator.refresh_repo_data().await;

    let ActionOutcome::Started(task) = coordinator.install("org.example.r").await else {
        panic!("install should start");
    };
    let err = task.wait().await.expect("finished").expect_err("policy blocks install");
    assert_eq!(err.kind(), ErrorKind::PolicyRestricted);
    assert_eq!(rt.registry().get("org.example.r"), InstallStatus::Installable);
    assert_eq!(rt.registry().progress("org.example.r"), None);
    assert_eq!(coordinator.last_error(), Some(err));
}

#[tokio::test]
/// What: Bytes not matching the published digest are never installed.
///
/// Inputs:
/// - Release info declaring one digest while the mirror serves other bytes of equal size.
///
/// Output:
/// - `VerificationFailure`, nothing installed, status restored.
async fn tampered_artifact_is_rejected() {
    let fx = Fixture::new();
    let declared = package_bytes("a");
    let served = package_bytes("b");
    let info = RemoteAppInfo {
        version: "1.0".to_string(),
        version_code: 1,
        min_sdk: 21,
        short_description: None,
        variants: vec![ArtifactVariant {
            abi: None,
            files: vec![ArtifactFile {
                name: "base.apk".to_string(),
                size: declared.len() as u64,
                sha256: storekeep::install::verify::sha256_hex(&declared),
            }],
        }],
    };
    fx.publish_info("org.example.t", &info, &[("base.apk", served.as_slice())]);
    let rt = fx.refreshed_runtime().await;

    let ActionOutcome::Started(task) = rt.coordinator().install("org.example.t").await else {
        panic!("install should start");
    };
    let err = task.wait().await.expect("finished").expect_err("digest mismatch");
    assert_eq!(err.kind(), ErrorKind::VerificationFailure);
    assert!(!fx.installed_file("org.example.t", "base.apk").exists());
    assert_eq!(rt.registry().get("org.example.t"), InstallStatus::Installable);
}

#[tokio::test]
/// What: The client never uninstalls itself.
///
/// Inputs:
/// - The self package installed through the coordinator.
///
/// Output:
/// - `Rejected`; the package stays installed.
async fn self_package_cannot_be_removed() {
    let fx = Fixture::new();
    let bytes = package_bytes("s");
    fx.publish("app.storekeep.client", 1, 21, &[("base.apk", bytes.as_slice())]);
    let rt = fx.refreshed_runtime().await;
    let coordinator = rt.coordinator();
    let ActionOutcome::Started(task) = coordinator.install("app.storekeep.client").await else {
        panic!("install should start");
    };
    assert!(task.wait().await.expect("finished").is_ok());

    assert!(matches!(
        coordinator.uninstall("app.storekeep.client").await,
        ActionOutcome::Rejected
    ));
    assert!(fx.installed_file("app.storekeep.client", "base.apk").exists());
    assert!(!coordinator.actions("app.storekeep.client", 21).uninstall);
}
