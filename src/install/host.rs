//! Seam to the OS package manager.

use async_trait::async_trait;

use super::error::InstallError;
use crate::state::InstallStatus;

/// What the host knows about an installed package.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstalledPackage {
    /// Installed version code.
    pub version_code: u64,
    /// Whether the package is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Serde default for [`InstalledPackage::enabled`].
const fn default_enabled() -> bool {
    true
}

/// Capabilities of the device the client runs on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Platform SDK level.
    pub sdk: u32,
    /// Supported ABIs in preference order.
    pub abis: Vec<String>,
    /// Whether installs/uninstalls bypass the OS confirmation dialog.
    pub privileged: bool,
}

/// A verified artifact file ready for the host installer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedFile {
    /// File name as published by the repository.
    pub name: String,
    /// Verified contents.
    pub bytes: Vec<u8>,
}

/// OS package operations used by the installer and the coordinator.
#[async_trait]
pub trait PackageHost: Send + Sync {
    /// Installed state of `id`, or `None` when it is not installed.
    async fn installed(&self, id: &str) -> Result<Option<InstalledPackage>, InstallError>;

    /// Device capabilities.
    fn device(&self) -> DeviceProfile;

    /// `Err(PolicyRestricted)` when device policy forbids installing apps.
    fn check_install_allowed(&self) -> Result<(), InstallError>;

    /// `Err(PolicyRestricted)` when device policy forbids uninstalling apps.
    fn check_uninstall_allowed(&self) -> Result<(), InstallError>;

    /// Install (or update) `id` at `version_code` from verified files.
    async fn install(
        &self,
        id: &str,
        version_code: u64,
        files: Vec<StagedFile>,
    ) -> Result<(), InstallError>;

    /// Remove `id` from the device.
    async fn uninstall(&self, id: &str) -> Result<(), InstallError>;

    /// Start the app; `Err(LaunchUnavailable)` when nothing can open it.
    async fn launch(&self, id: &str) -> Result<(), InstallError>;

    /// Show the OS app-info page; `Err(LaunchUnavailable)` when it cannot resolve.
    async fn open_app_info(&self, id: &str) -> Result<(), InstallError>;
}

/// What: Derive a status from the host's view of a package.
///
/// Inputs:
/// - `installed`: Host record, `None` when not installed
/// - `latest_version_code`: Latest version offered by the repository, if known
///
/// Output:
/// - `Installable`, `Disabled`, `Updatable` or `Installed`.
///
/// Details:
/// - Disabled wins over updatable: the user must enable the app before it can
///   be updated.
/// - Without a known latest version an installed package counts as `Installed`.
#[must_use]
pub fn status_for(
    installed: Option<&InstalledPackage>,
    latest_version_code: Option<u64>,
) -> InstallStatus {
    match installed {
        None => InstallStatus::Installable,
        Some(pkg) if !pkg.enabled => InstallStatus::Disabled,
        Some(pkg) => match latest_version_code {
            Some(latest) if pkg.version_code < latest => InstallStatus::Updatable,
            _ => InstallStatus::Installed,
        },
    }
}

/// What: Query the host and derive the install status of `id`.
///
/// # Errors
/// - Propagates host query failures; callers treat them as `Unknown`.
pub async fn package_install_status(
    host: &dyn PackageHost,
    id: &str,
    latest_version_code: Option<u64>,
) -> Result<InstallStatus, InstallError> {
    let installed = host.installed(id).await?;
    Ok(status_for(installed.as_ref(), latest_version_code))
}
