//! Package host backed by a directory tree.
//!
//! Layout below the root:
//!
//! ```text
//! packages/<id>/package.json   installed record ({"version_code":..,"enabled":..})
//! packages/<id>/<file>         installed artifact files
//! ```
//!
//! Installs are staged into `packages/.staging-<id>` and renamed into place.
//! The previous version is first moved to `packages/.replaced-<id>`, so a
//! failed install never leaves a half-written package behind. An install
//! interrupted between the two renames is rolled back by the next install.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::error::{InstallError, LaunchTarget};
use super::host::{DeviceProfile, InstalledPackage, PackageHost, StagedFile};

/// Installed-record file name inside each package directory.
const RECORD_FILE: &str = "package.json";

/// Device policy flags enforced by [`DirectoryHost`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostPolicy {
    /// Reject every install with `PolicyRestricted`.
    pub disallow_install: bool,
    /// Reject every uninstall with `PolicyRestricted`.
    pub disallow_uninstall: bool,
}

/// [`PackageHost`] that keeps installed packages in a directory.
pub struct DirectoryHost {
    /// Device root; packages live in `root/packages`.
    root: PathBuf,
    /// Reported device capabilities.
    device: DeviceProfile,
    /// Install/uninstall restrictions.
    policy: HostPolicy,
}

impl DirectoryHost {
    /// What: Create a host rooted at `root`.
    ///
    /// Inputs:
    /// - `root`: Device root directory (created lazily on first install)
    /// - `device`: Capabilities reported to the installer
    /// - `policy`: Install/uninstall restrictions
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, device: DeviceProfile, policy: HostPolicy) -> Self {
        Self {
            root: root.into(),
            device,
            policy,
        }
    }

    /// Directory holding every installed package.
    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    /// Directory of one installed package.
    fn package_dir(&self, id: &str) -> Result<PathBuf, InstallError> {
        Ok(self
            .packages_dir()
            .join(crate::sources::checked_segment(id)?))
    }

    /// What: Enable or disable an installed package.
    ///
    /// # Errors
    /// - `ArtifactNotFound` when `id` is not installed.
    /// - I/O failures mapped through the taxonomy.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), InstallError> {
        let dir = self.package_dir(id)?;
        let Some(mut record) = self.installed(id).await? else {
            return Err(InstallError::ArtifactNotFound(format!("{id} is not installed")));
        };
        record.enabled = enabled;
        let body = serde_json::to_vec_pretty(&record)?;
        run_blocking(move || std::fs::write(dir.join(RECORD_FILE), body)).await?;
        info!(id = %id, enabled, "package enabled state changed");
        Ok(())
    }
}

/// Run filesystem work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, InstallError>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| InstallError::MalformedPackage(format!("host task failed: {e}")))?
        .map_err(InstallError::from)
}

/// Read an installed record; `None` when the package directory has none.
fn read_record(dir: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match std::fs::read(dir.join(RECORD_FILE)) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write `files` plus the record into a staging dir and swap it into place.
fn commit_install(
    packages: &Path,
    id: &str,
    record: &[u8],
    files: &[StagedFile],
) -> std::io::Result<()> {
    std::fs::create_dir_all(packages)?;
    let staging = packages.join(format!(".staging-{id}"));
    let replaced = packages.join(format!(".replaced-{id}"));
    let target = packages.join(id);
    if replaced.exists() {
        if target.exists() {
            std::fs::remove_dir_all(&replaced)?;
        } else {
            warn!(id = %id, "restoring package left aside by an interrupted install");
            std::fs::rename(&replaced, &target)?;
        }
    }
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    std::fs::create_dir_all(&staging)?;
    for file in files {
        std::fs::write(staging.join(&file.name), &file.bytes)?;
    }
    std::fs::write(staging.join(RECORD_FILE), record)?;
    if !target.exists() {
        return std::fs::rename(&staging, &target);
    }
    std::fs::rename(&target, &replaced)?;
    if let Err(e) = std::fs::rename(&staging, &target) {
        std::fs::rename(&replaced, &target)?;
        return Err(e);
    }
    if let Err(e) = std::fs::remove_dir_all(&replaced) {
        warn!(id = %id, error = %e, "failed to remove replaced package files");
    }
    Ok(())
}

#[async_trait]
impl PackageHost for DirectoryHost {
    async fn installed(&self, id: &str) -> Result<Option<InstalledPackage>, InstallError> {
        let dir = self.package_dir(id)?;
        let Some(bytes) = run_blocking(move || read_record(&dir)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn device(&self) -> DeviceProfile {
        self.device.clone()
    }

    fn check_install_allowed(&self) -> Result<(), InstallError> {
        if self.policy.disallow_install {
            return Err(InstallError::PolicyRestricted(
                "installing apps is disallowed on this device".to_string(),
            ));
        }
        Ok(())
    }

    fn check_uninstall_allowed(&self) -> Result<(), InstallError> {
        if self.policy.disallow_uninstall {
            return Err(InstallError::PolicyRestricted(
                "uninstalling apps is disallowed on this device".to_string(),
            ));
        }
        Ok(())
    }

    async fn install(
        &self,
        id: &str,
        version_code: u64,
        files: Vec<StagedFile>,
    ) -> Result<(), InstallError> {
        self.check_install_allowed()?;
        for file in &files {
            if crate::sources::checked_segment(&file.name)? == RECORD_FILE {
                return Err(InstallError::MalformedPackage(format!(
                    "artifact name {RECORD_FILE} is reserved"
                )));
            }
        }
        let id_owned = crate::sources::checked_segment(id)?.to_string();
        let record = serde_json::to_vec_pretty(&InstalledPackage {
            version_code,
            enabled: true,
        })?;
        let packages = self.packages_dir();
        debug!(id = %id, version_code, files = files.len(), "committing package");
        run_blocking(move || commit_install(&packages, &id_owned, &record, &files)).await
    }

    async fn uninstall(&self, id: &str) -> Result<(), InstallError> {
        self.check_uninstall_allowed()?;
        let dir = self.package_dir(id)?;
        run_blocking(move || std::fs::remove_dir_all(dir)).await
    }

    async fn launch(&self, id: &str) -> Result<(), InstallError> {
        match self.installed(id).await {
            Ok(Some(pkg)) if pkg.enabled => {
                info!(id = %id, version_code = pkg.version_code, "launching app");
                Ok(())
            }
            _ => Err(InstallError::LaunchUnavailable(LaunchTarget::App)),
        }
    }

    async fn open_app_info(&self, id: &str) -> Result<(), InstallError> {
        match self.installed(id).await {
            Ok(Some(_)) => {
                info!(id = %id, "opening app info");
                Ok(())
            }
            _ => Err(InstallError::LaunchUnavailable(LaunchTarget::AppInfo)),
        }
    }
}
