//! Download, verify and hand off packages to the host.
//!
//! [`PackageInstaller`] owns the at-most-one-install-per-package rule: every
//! attempt claims its package id in an in-flight set for its whole duration,
//! and a concurrent attempt for the same id is coalesced into
//! [`InstallOutcome::AlreadyInProgress`] without touching the host.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::error::InstallError;
use super::host::{PackageHost, StagedFile};
use super::verify::{verify_integrity, verify_structure};
use crate::sources::RepoDataRepository;
use crate::state::DownloadProgress;

/// Result of a successful [`PackageInstaller::download_and_install`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The package was installed at `version_code`.
    Installed {
        /// Installed version code.
        version_code: u64,
    },
    /// Another attempt for the same package is running; nothing was done.
    AlreadyInProgress,
}

/// Package ids with an attempt currently running.
type InFlight = Arc<Mutex<HashSet<String>>>;

/// Claim on a package id, released when dropped.
struct InFlightClaim {
    /// Set the id was inserted into.
    set: InFlight,
    /// Claimed id.
    id: String,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}

/// Turns chunk lengths into clamped, strictly increasing progress callbacks.
struct ProgressReporter<'a, P> {
    /// Expected total bytes.
    total: u64,
    /// Bytes received so far across all files.
    received: u64,
    /// Last `part` emitted.
    last: Option<u64>,
    /// Caller's callback.
    sink: &'a mut P,
}

impl<'a, P: FnMut(DownloadProgress)> ProgressReporter<'a, P> {
    /// Start reporting against `total` bytes.
    const fn new(total: u64, sink: &'a mut P) -> Self {
        Self {
            total,
            received: 0,
            last: None,
            sink,
        }
    }

    /// Emit `part` unless it would not move progress forward.
    fn emit(&mut self, part: u64) {
        let part = part.min(self.total);
        if self.last.is_some_and(|last| part <= last) {
            return;
        }
        self.last = Some(part);
        (self.sink)(DownloadProgress::new(part, self.total));
    }

    /// Account for `n` more bytes.
    fn advance(&mut self, n: usize) {
        self.received = self.received.saturating_add(n as u64);
        self.emit(self.received);
    }

    /// Make sure the last emitted value is `(total, total)`.
    fn finish(&mut self) {
        self.emit(self.total);
    }
}

/// Performs downloads, verification and host installs.
pub struct PackageInstaller {
    /// Metadata and artifact source.
    repo: Arc<dyn RepoDataRepository>,
    /// OS package manager.
    host: Arc<dyn PackageHost>,
    /// Running attempts.
    in_flight: InFlight,
    /// Where install/remove audit lines go, if anywhere.
    audit_dir: Option<PathBuf>,
}

impl PackageInstaller {
    /// Create an installer over a repository and a host.
    #[must_use]
    pub fn new(repo: Arc<dyn RepoDataRepository>, host: Arc<dyn PackageHost>) -> Self {
        Self {
            repo,
            host,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            audit_dir: None,
        }
    }

    /// Write install/remove audit lines below `dir`.
    #[must_use]
    pub fn with_audit_dir(mut self, dir: PathBuf) -> Self {
        self.audit_dir = Some(dir);
        self
    }

    /// Repository the installer downloads from.
    #[must_use]
    pub fn repo(&self) -> &Arc<dyn RepoDataRepository> {
        &self.repo
    }

    /// Host the installer hands packages to.
    #[must_use]
    pub fn host(&self) -> &Arc<dyn PackageHost> {
        &self.host
    }

    /// Whether an attempt for `id` is currently running.
    #[must_use]
    pub fn is_in_flight(&self, id: &str) -> bool {
        self.in_flight.lock().contains(id)
    }

    /// Claim `id`, or `None` if another attempt holds it.
    fn claim(&self, id: &str) -> Option<InFlightClaim> {
        let mut set = self.in_flight.lock();
        if !set.insert(id.to_string()) {
            return None;
        }
        Some(InFlightClaim {
            set: Arc::clone(&self.in_flight),
            id: id.to_string(),
        })
    }

    /// What: Download, verify and install the latest release of `id`.
    ///
    /// Inputs:
    /// - `id`: Package id known to the repository
    /// - `expected_version_code`: Version the caller decided to install, if pinned
    /// - `on_progress`: Receives strictly increasing cumulative progress
    /// - `on_complete`: Called exactly once after the host accepted the package
    ///
    /// Output:
    /// - `Installed` on success, `AlreadyInProgress` when coalesced into a
    ///   running attempt (no callback fires in that case).
    ///
    /// # Errors
    /// - `PolicyRestricted` when the host forbids installs.
    /// - `ArtifactNotFound` when the pinned version is no longer offered.
    /// - `UnsupportedDevice` when the SDK level or ABIs do not match.
    /// - `VerificationFailure` / `MalformedPackage` for bad downloads; the host
    ///   never sees such files.
    /// - Any repository or host error, unchanged.
    ///
    /// Details:
    /// - No progress entry exists while release info is being resolved; the
    ///   first callback is `(0, total)` once sizes are known, the last one
    ///   before `on_complete` is `(total, total)`.
    pub async fn download_and_install<P, C>(
        &self,
        id: &str,
        expected_version_code: Option<u64>,
        mut on_progress: P,
        on_complete: C,
    ) -> Result<InstallOutcome, InstallError>
    where
        P: FnMut(DownloadProgress) + Send,
        C: FnOnce() + Send,
    {
        let Some(_claim) = self.claim(id) else {
            info!(id = %id, "install already in progress; coalescing request");
            return Ok(InstallOutcome::AlreadyInProgress);
        };
        self.host.check_install_allowed()?;

        let info = self.repo.get_app_repo_data(id).await?;
        if let Some(expected) = expected_version_code
            && expected != info.version_code
        {
            return Err(InstallError::ArtifactNotFound(format!(
                "version {expected} of {id} is no longer offered (latest is {})",
                info.version_code
            )));
        }
        let device = self.host.device();
        if info.min_sdk > device.sdk {
            return Err(InstallError::UnsupportedDevice(format!(
                "requires SDK {}, device has {}",
                info.min_sdk, device.sdk
            )));
        }
        let variant = info.select_variant(&device.abis).ok_or_else(|| {
            InstallError::UnsupportedDevice(format!(
                "no build for {}",
                if device.abis.is_empty() {
                    "this device".to_string()
                } else {
                    device.abis.join(", ")
                }
            ))
        })?;

        let total = variant.total_size().ok_or_else(|| {
            InstallError::DecodeFailure(format!("declared file sizes of {id} overflow"))
        })?;
        info!(
            id = %id,
            version_code = info.version_code,
            files = variant.files.len(),
            total,
            "starting download"
        );
        let mut reporter = ProgressReporter::new(total, &mut on_progress);
        reporter.emit(0);
        let mut staged = Vec::with_capacity(variant.files.len());
        for file in &variant.files {
            let bytes = self
                .repo
                .fetch_artifact(id, info.version_code, file, &mut |n| reporter.advance(n))
                .await?;
            verify_integrity(file, &bytes)?;
            verify_structure(&file.name, &bytes)?;
            debug!(id = %id, file = %file.name, bytes = bytes.len(), "artifact verified");
            staged.push(StagedFile {
                name: file.name.clone(),
                bytes,
            });
        }
        reporter.finish();

        self.host.install(id, info.version_code, staged).await?;
        on_complete();
        info!(id = %id, version_code = info.version_code, "package installed");
        if let Some(dir) = &self.audit_dir
            && let Err(e) = super::logging::log_installed(dir, id, info.version_code)
        {
            warn!(error = %e, id = %id, "failed to write install audit log");
        }
        Ok(InstallOutcome::Installed {
            version_code: info.version_code,
        })
    }

    /// What: Remove `id` from the device.
    ///
    /// # Errors
    /// - `PolicyRestricted` when the host forbids uninstalls.
    /// - Any host error, unchanged.
    pub async fn uninstall_app(&self, id: &str) -> Result<(), InstallError> {
        self.host.check_uninstall_allowed()?;
        self.host.uninstall(id).await?;
        info!(id = %id, "package removed");
        if let Some(dir) = &self.audit_dir
            && let Err(e) = super::logging::log_removed(dir, id)
        {
            warn!(error = %e, id = %id, "failed to write remove audit log");
        }
        Ok(())
    }
}
