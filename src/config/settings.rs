use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::skeleton::SETTINGS_SKELETON_CONTENT;
use crate::install::{DeviceProfile, HostPolicy};
use crate::jobs::NetworkType;
use crate::logic::InstallPolicy;
use crate::util::config::{parse_bool, parse_key_value, skip_comment_or_empty};

/// User preferences, repository location and device profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Confirm privileged installs/uninstalls.
    pub require_user_action: bool,
    /// Install updates in the background.
    pub automatic_updates: bool,
    /// Network constraint forwarded to background jobs.
    pub updater_network_type: NetworkType,
    /// Hours between background runs.
    pub auto_update_interval_hours: u64,
    /// HTTP(S) base URL or local mirror directory.
    pub repository_url: String,
    /// Directory holding installed packages; `None` uses the config default.
    pub device_root: Option<PathBuf>,
    /// Device SDK level.
    pub device_sdk: u32,
    /// Device ABIs, most preferred first.
    pub device_abis: Vec<String>,
    /// Installs bypass OS confirmation.
    pub privileged_installer: bool,
    /// Package id of this client.
    pub self_package_id: Option<String>,
    /// Device policy forbids installs.
    pub disallow_install: bool,
    /// Device policy forbids uninstalls.
    pub disallow_uninstall: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            require_user_action: true,
            automatic_updates: true,
            updater_network_type: NetworkType::Any,
            auto_update_interval_hours: 4,
            repository_url: "https://repo.example.org".to_string(),
            device_root: None,
            device_sdk: 34,
            device_abis: vec!["arm64-v8a".to_string(), "armeabi-v7a".to_string()],
            privileged_installer: false,
            self_package_id: Some("app.storekeep.client".to_string()),
            disallow_install: false,
            disallow_uninstall: false,
        }
    }
}

impl Settings {
    /// Device capabilities reported by the host.
    #[must_use]
    pub fn device_profile(&self) -> DeviceProfile {
        DeviceProfile {
            sdk: self.device_sdk,
            abis: self.device_abis.clone(),
            privileged: self.privileged_installer,
        }
    }

    /// Device policy flags.
    #[must_use]
    pub const fn host_policy(&self) -> HostPolicy {
        HostPolicy {
            disallow_install: self.disallow_install,
            disallow_uninstall: self.disallow_uninstall,
        }
    }

    /// Coordinator policy.
    #[must_use]
    pub fn install_policy(&self) -> InstallPolicy {
        InstallPolicy {
            require_user_action: self.require_user_action,
            self_package_id: self.self_package_id.clone(),
        }
    }
}

/// Parse a boolean value, keeping `current` (and warning) when invalid.
fn bool_or(key: &str, val: &str, current: bool) -> bool {
    parse_bool(val).unwrap_or_else(|| {
        warn!(key = %key, value = val, "[Config] invalid boolean, keeping default");
        current
    })
}

/// What: Parse `settings.conf` content on top of the defaults.
///
/// Inputs:
/// - `content`: File content
///
/// Output:
/// - `Settings` with every recognized key applied.
///
/// Details:
/// - Unknown keys and unparsable values are logged and ignored.
/// - Empty `device_root`/`self_package_id` values unset the option.
#[must_use]
pub fn parse_settings(content: &str) -> Settings {
    let mut out = Settings::default();
    for line in content.lines() {
        if skip_comment_or_empty(line) {
            continue;
        }
        let Some((key, val)) = parse_key_value(line) else {
            continue;
        };
        let val = val.as_str();
        match key.as_str() {
            "require_user_action" => {
                out.require_user_action = bool_or(&key, val, out.require_user_action);
            }
            "automatic_updates" => {
                out.automatic_updates = bool_or(&key, val, out.automatic_updates);
            }
            "updater_network_type" | "network_type" => match val.parse::<NetworkType>() {
                Ok(nt) => out.updater_network_type = nt,
                Err(e) => warn!(key = %key, error = %e, "[Config] invalid network type"),
            },
            "auto_update_interval_hours" => match val.parse::<u64>() {
                Ok(h) if h > 0 => out.auto_update_interval_hours = h,
                _ => warn!(key = %key, value = val, "[Config] invalid interval, keeping default"),
            },
            "repository_url" | "repo" => {
                if !val.is_empty() {
                    out.repository_url = val.to_string();
                }
            }
            "device_root" => {
                out.device_root = (!val.is_empty()).then(|| PathBuf::from(val));
            }
            "device_sdk" => match val.parse::<u32>() {
                Ok(sdk) => out.device_sdk = sdk,
                Err(_) => warn!(key = %key, value = val, "[Config] invalid SDK level"),
            },
            "device_abis" => {
                out.device_abis = val
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "privileged_installer" => {
                out.privileged_installer = bool_or(&key, val, out.privileged_installer);
            }
            "self_package_id" => {
                out.self_package_id = (!val.is_empty()).then(|| val.to_string());
            }
            "disallow_install" => {
                out.disallow_install = bool_or(&key, val, out.disallow_install);
            }
            "disallow_uninstall" => {
                out.disallow_uninstall = bool_or(&key, val, out.disallow_uninstall);
            }
            _ => debug!(key = %key, "[Config] ignoring unknown key"),
        }
    }
    out
}

/// What: Load settings from `path`, writing the skeleton when the file is missing.
///
/// Inputs:
/// - `path`: `settings.conf` location
///
/// Output:
/// - Parsed settings; defaults when the file cannot be read.
#[must_use]
pub fn load_settings(path: &Path) -> Settings {
    let missing = fs::metadata(path).map_or(true, |m| m.len() == 0);
    if missing {
        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }
        match fs::write(path, SETTINGS_SKELETON_CONTENT) {
            Ok(()) => debug!(path = %path.display(), "[Config] wrote settings skeleton"),
            Err(e) => warn!(path = %path.display(), error = %e, "[Config] could not write skeleton"),
        }
    }
    match fs::read_to_string(path) {
        Ok(content) => {
            debug!(path = %path.display(), bytes = content.len(), "[Config] loaded settings.conf");
            parse_settings(&content)
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "[Config] settings.conf missing or unreadable, using defaults"
            );
            Settings::default()
        }
    }
}
