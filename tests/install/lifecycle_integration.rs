//! Integration tests for the install → update → uninstall lifecycle.
//!
//! Tests cover:
//! - Fresh install from a local mirror into the directory host
//! - Update detection after a new release is published
//! - Uninstall and the audit logs
//! - Disabled packages and the app-info/open actions

#![cfg(test)]

use std::fs;

use storekeep::install::{InstallOutcome, PackageHost};
use storekeep::logic::{ActionOutcome, PrimaryAction};
use storekeep::state::InstallStatus;

use crate::common::{Fixture, package_bytes, read_log};

const ID: &str = "org.example.notes";

/// What: Wait for a started install and return its outcome.
async fn run_install(outcome: ActionOutcome) -> InstallOutcome {
    let ActionOutcome::Started(task) = outcome else {
        panic!("expected a started install, got {outcome:?}");
    };
    task.wait()
        .await
        .expect("task finished")
        .expect("install succeeded")
}

#[tokio::test]
/// What: A package goes Installable → Installed → Updatable → Installed → Installable.
///
/// Inputs:
/// - Mirror publishing v1, later v2; default settings (non-privileged).
///
/// Output:
/// - Each status transition, installed bytes matching the release, and
///   one audit line per install and removal.
async fn install_update_uninstall_round_trip() {
    let fx = Fixture::new();
    let v1 = package_bytes("one");
    fx.publish(ID, 1, 21, &[("base.apk", v1.as_slice())]);
    let rt = fx.refreshed_runtime().await;
    let coordinator = rt.coordinator();
    assert_eq!(coordinator.resolve_status(ID).await, Some(InstallStatus::Installable));

    let outcome = run_install(coordinator.install(ID).await).await;
    assert_eq!(outcome, InstallOutcome::Installed { version_code: 1 });
    assert_eq!(rt.registry().get(ID), InstallStatus::Installed);
    assert_eq!(rt.registry().progress(ID), None);
    assert_eq!(fs::read(fx.installed_file(ID, "base.apk")).expect("installed"), v1);

    let v2 = package_bytes("two");
    fx.publish(ID, 2, 21, &[("base.apk", v2.as_slice())]);
    coordinator.refresh_repo_data().await;
    assert_eq!(rt.registry().get(ID), InstallStatus::Updatable);
    assert_eq!(
        coordinator.actions(ID, 21).primary,
        Some(PrimaryAction::Update)
    );

    let outcome = run_install(coordinator.install(ID).await).await;
    assert_eq!(outcome, InstallOutcome::Installed { version_code: 2 });
    assert_eq!(fs::read(fx.installed_file(ID, "base.apk")).expect("installed"), v2);
    let record = rt.host().installed(ID).await.expect("query").expect("present");
    assert_eq!(record.version_code, 2);

    assert!(matches!(coordinator.uninstall(ID).await, ActionOutcome::Done));
    assert_eq!(rt.registry().get(ID), InstallStatus::Installable);
    assert!(!fx.installed_file(ID, "base.apk").exists());

    let installs = read_log(&fx.logs_dir().join("install_log.log"));
    assert_eq!(installs.lines().count(), 2, "{installs}");
    assert!(installs.lines().all(|l| l.contains(ID)));
    let removals = read_log(&fx.logs_dir().join("remove_log.log"));
    assert_eq!(removals.lines().count(), 1, "{removals}");
}

#[tokio::test]
/// What: A disabled package offers "enable" and only the app-info page opens.
///
/// Inputs:
/// - Installed package disabled through the host.
///
/// Output:
/// - Status `Disabled`; open fails with "Couldn't open app"; app info succeeds.
async fn disabled_package_opens_app_info_only() {
    let fx = Fixture::new();
    let v1 = package_bytes("one");
    fx.publish(ID, 1, 21, &[("base.apk", v1.as_slice())]);
    let rt = fx.refreshed_runtime().await;
    let coordinator = rt.coordinator();
    run_install(coordinator.install(ID).await).await;

    rt.host().set_enabled(ID, false).await.expect("disable");
    coordinator.refresh_statuses().await;
    assert_eq!(rt.registry().get(ID), InstallStatus::Disabled);
    assert_eq!(coordinator.actions(ID, 21).primary, Some(PrimaryAction::Enable));

    assert!(matches!(coordinator.open(ID).await, ActionOutcome::Failed));
    assert_eq!(
        coordinator.take_error().map(|e| e.user_message()).as_deref(),
        Some("Couldn't open app")
    );
    assert!(matches!(coordinator.open_app_info(ID).await, ActionOutcome::Done));
    assert_eq!(rt.registry().get(ID), InstallStatus::Disabled);
}

#[tokio::test]
/// What: Unknown ids resolve to `None` and installing them does nothing.
async fn unknown_package_is_not_resolved() {
    let fx = Fixture::new();
    let rt = fx.refreshed_runtime().await;
    assert_eq!(rt.coordinator().resolve_status("org.example.missing").await, None);
    assert!(matches!(
        rt.coordinator().install("org.example.missing").await,
        ActionOutcome::Ignored
    ));
}
