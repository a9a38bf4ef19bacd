//! Integration tests for loading, saving and applying settings.
//!
//! Tests cover:
//! - First run writing the skeleton
//! - Saving a preference in place
//! - Settings flowing into the runtime (device profile, policy, jobs)

#![cfg(test)]

use std::fs;
use std::time::Duration;

use storekeep::app::Runtime;
use storekeep::config::{self, Settings};
use storekeep::install::PackageHost;
use storekeep::jobs::NetworkType;

#[test]
/// What: The first load writes the skeleton and yields defaults.
///
/// Inputs:
/// - Empty config directory.
///
/// Output:
/// - `settings.conf` exists with every key; parsed settings equal the defaults.
fn first_load_writes_skeleton() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = config::settings_path(dir.path());
    let settings = config::load_settings(&path);
    assert_eq!(settings, Settings::default());
    let content = fs::read_to_string(&path).expect("skeleton written");
    for key in [
        "require_user_action",
        "automatic_updates",
        "updater_network_type",
        "auto_update_interval_hours",
        "repository_url",
        "device_sdk",
        "device_abis",
        "privileged_installer",
        "self_package_id",
        "disallow_install",
        "disallow_uninstall",
    ] {
        assert!(content.contains(key), "missing {key}");
    }
}

#[test]
/// What: Saving a boolean rewrites only that key and keeps the comments.
///
/// Inputs:
/// - Skeleton file; `automatic_updates` saved as `false`.
///
/// Output:
/// - Reloaded settings have automatic updates off; comment lines are unchanged.
fn save_boolean_key_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = config::settings_path(dir.path());
    let _ = config::load_settings(&path);
    let before = fs::read_to_string(&path).expect("read");

    config::save_boolean_key(&path, "automatic_updates", false).expect("save");
    let after = fs::read_to_string(&path).expect("read");
    assert!(!config::load_settings(&path).automatic_updates);
    assert_eq!(before.lines().count(), after.lines().count());
    let comments = |s: &str| s.lines().filter(|l| l.starts_with('#')).count();
    assert_eq!(comments(&before), comments(&after));
}

#[tokio::test]
/// What: File settings shape the device, policy and job schedule of the runtime.
///
/// Inputs:
/// - `settings.conf` with SDK 30, one ABI, privileged installer,
///   unmetered network and a 12 hour interval.
///
/// Output:
/// - Host reports the configured device; confirmation is required; jobs use
///   the configured network and period.
async fn runtime_applies_file_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mirror = dir.path().join("mirror");
    fs::create_dir_all(&mirror).expect("mirror");
    fs::write(
        config::settings_path(dir.path()),
        format!(
            "device_sdk = 30\n\
             device_abis = x86_64\n\
             privileged_installer = true\n\
             updater_network_type = unmetered\n\
             auto_update_interval_hours = 12\n\
             repository_url = {}\n",
            mirror.display()
        ),
    )
    .expect("write settings");

    let rt = Runtime::init(dir.path(), None).expect("runtime");
    let device = rt.host().device();
    assert_eq!(device.sdk, 30);
    assert_eq!(device.abis, vec!["x86_64".to_string()]);
    assert!(device.privileged);
    assert!(rt.coordinator().requires_confirmation());
    assert_eq!(rt.job_settings().constraints.network, NetworkType::Unmetered);
    assert_eq!(rt.job_period(), Duration::from_secs(12 * 3600));
}
