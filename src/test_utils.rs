//! Test utilities for common test setup.
//!
//! In-memory [`RepoDataRepository`] and [`PackageHost`] fakes shared by the
//! installer, coordinator and job tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::install::{
    DeviceProfile, InstallError, InstalledPackage, LaunchTarget, PackageHost, StagedFile,
    verify::sha256_hex,
};
use crate::sources::{ChunkSink, RepoDataRepository};
use crate::state::{AppMetadata, ArtifactFile, ArtifactVariant, RemoteAppInfo};

/// What: Build bytes that pass the structural package check.
///
/// Inputs: `seed` distinguishing payloads
///
/// Output: ZIP-headed bytes of length `4 + seed.len() * 100`
pub fn package_bytes(seed: &str) -> Vec<u8> {
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.extend(seed.repeat(100).into_bytes());
    bytes
}

/// What: Release info with one ABI-less variant matching `files`.
///
/// Inputs:
/// - `version_code`, `min_sdk`: Release fields
/// - `files`: `(name, bytes)` pairs; sizes and digests are computed
pub fn release(version_code: u64, min_sdk: u32, files: &[(&str, &[u8])]) -> RemoteAppInfo {
    RemoteAppInfo {
        version: format!("1.{version_code}"),
        version_code,
        min_sdk,
        short_description: None,
        variants: vec![ArtifactVariant {
            abi: None,
            files: files
                .iter()
                .map(|(name, bytes)| ArtifactFile {
                    name: (*name).to_string(),
                    size: bytes.len() as u64,
                    sha256: sha256_hex(bytes),
                })
                .collect(),
        }],
    }
}

/// In-memory repository.
#[derive(Default)]
pub struct FakeRepo {
    /// Trusted app list.
    apps: Mutex<Vec<AppMetadata>>,
    /// Release info (or failure) per package.
    infos: Mutex<HashMap<String, Result<RemoteAppInfo, InstallError>>>,
    /// Artifact bytes keyed by `(id, file name)`.
    blobs: Mutex<HashMap<(String, String), Vec<u8>>>,
    /// When set, downloads report half of each file and wait here.
    gate: Option<Arc<Notify>>,
    /// Failure returned by `fetch_repo_data`.
    refresh_error: Mutex<Option<InstallError>>,
    /// Number of `get_app_repo_data` calls.
    pub info_calls: AtomicUsize,
    /// Number of `fetch_artifact` calls.
    pub artifact_calls: AtomicUsize,
    /// Number of `fetch_repo_data` calls.
    pub refreshes: AtomicUsize,
}

impl FakeRepo {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an app whose artifacts are exactly `files`.
    pub fn with_app(self, id: &str, version_code: u64, min_sdk: u32, files: &[(&str, &[u8])]) -> Self {
        self.with_release(id, release(version_code, min_sdk, files), files)
    }

    /// Add an app with explicit release info and served bytes (which may
    /// disagree with the declared metadata).
    pub fn with_release(self, id: &str, info: RemoteAppInfo, served: &[(&str, &[u8])]) -> Self {
        self.apps.lock().push(AppMetadata {
            id: id.to_string(),
            name: format!("App {id}"),
        });
        self.infos.lock().insert(id.to_string(), Ok(info));
        let mut blobs = self.blobs.lock();
        for (name, bytes) in served {
            blobs.insert((id.to_string(), (*name).to_string()), bytes.to_vec());
        }
        drop(blobs);
        self
    }

    /// Hold every download halfway until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Make `get_app_repo_data(id)` fail with `err`.
    pub fn fail_info(&self, id: &str, err: InstallError) {
        self.infos.lock().insert(id.to_string(), Err(err));
    }

    /// Make `fetch_repo_data` fail with `err`.
    pub fn fail_refresh(&self, err: InstallError) {
        *self.refresh_error.lock() = Some(err);
    }
}

#[async_trait]
impl RepoDataRepository for FakeRepo {
    async fn get_apps(&self) -> Vec<AppMetadata> {
        self.apps.lock().clone()
    }

    async fn get_app(&self, id: &str) -> Option<AppMetadata> {
        self.apps.lock().iter().find(|a| a.id == id).cloned()
    }

    async fn get_app_repo_data(&self, id: &str) -> Result<RemoteAppInfo, InstallError> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.infos
            .lock()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(InstallError::ArtifactNotFound(format!("no app {id}"))))
    }

    async fn fetch_repo_data(&self) -> Result<(), InstallError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.refresh_error.lock().clone().map_or(Ok(()), Err)
    }

    async fn fetch_artifact(
        &self,
        id: &str,
        _version_code: u64,
        file: &ArtifactFile,
        on_chunk: ChunkSink<'_>,
    ) -> Result<Vec<u8>, InstallError> {
        self.artifact_calls.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .blobs
            .lock()
            .get(&(id.to_string(), file.name.clone()))
            .cloned()
            .ok_or_else(|| InstallError::ArtifactNotFound(file.name.clone()))?;
        let half = bytes.len() / 2;
        if let Some(gate) = &self.gate {
            on_chunk(half);
            gate.notified().await;
            on_chunk(bytes.len() - half);
        } else {
            on_chunk(half);
            on_chunk(bytes.len() - half);
        }
        Ok(bytes)
    }
}

/// In-memory package host.
pub struct FakeHost {
    /// Reported device profile.
    device: Mutex<DeviceProfile>,
    /// Installed packages.
    packages: Mutex<HashMap<String, InstalledPackage>>,
    /// Files handed over by the last install of each package.
    pub staged: Mutex<HashMap<String, Vec<StagedFile>>>,
    /// Number of `install` calls.
    pub install_calls: AtomicUsize,
    /// Number of `uninstall` calls.
    pub uninstall_calls: AtomicUsize,
    /// Make `installed` fail.
    pub fail_query: AtomicBool,
    /// Failure returned by `install`.
    pub install_error: Mutex<Option<InstallError>>,
    /// Reject installs by policy.
    pub disallow_install: AtomicBool,
    /// Reject uninstalls by policy.
    pub disallow_uninstall: AtomicBool,
    /// Panic inside `install`.
    pub panic_on_install: AtomicBool,
    /// One-shot `(reached, release)` pair: the next `installed` call reads its
    /// answer, notifies `reached` and waits for `release` before returning.
    query_gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl FakeHost {
    /// Host with the given SDK level, one ABI and privileged flag.
    pub fn new(sdk: u32, privileged: bool) -> Self {
        Self {
            device: Mutex::new(DeviceProfile {
                sdk,
                abis: vec!["arm64-v8a".to_string()],
                privileged,
            }),
            packages: Mutex::new(HashMap::new()),
            staged: Mutex::new(HashMap::new()),
            install_calls: AtomicUsize::new(0),
            uninstall_calls: AtomicUsize::new(0),
            fail_query: AtomicBool::new(false),
            install_error: Mutex::new(None),
            disallow_install: AtomicBool::new(false),
            disallow_uninstall: AtomicBool::new(false),
            panic_on_install: AtomicBool::new(false),
            query_gate: Mutex::new(None),
        }
    }

    /// Pre-install `id` at `version_code`.
    pub fn with_installed(self, id: &str, version_code: u64, enabled: bool) -> Self {
        self.packages.lock().insert(
            id.to_string(),
            InstalledPackage {
                version_code,
                enabled,
            },
        );
        self
    }

    /// Replace the reported ABIs.
    pub fn set_abis(&self, abis: &[&str]) {
        self.device.lock().abis = abis.iter().map(|a| (*a).to_string()).collect();
    }

    /// Hold the next `installed` query after it read its answer.
    pub fn gate_next_query(&self, reached: Arc<Notify>, release: Arc<Notify>) {
        *self.query_gate.lock() = Some((reached, release));
    }

    /// Installed record of `id`.
    pub fn package(&self, id: &str) -> Option<InstalledPackage> {
        self.packages.lock().get(id).cloned()
    }
}

#[async_trait]
impl PackageHost for FakeHost {
    async fn installed(&self, id: &str) -> Result<Option<InstalledPackage>, InstallError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(InstallError::MalformedPackage("host query failed".to_string()));
        }
        let answer = self.package(id);
        let gate = self.query_gate.lock().take();
        if let Some((reached, release)) = gate {
            reached.notify_one();
            release.notified().await;
        }
        Ok(answer)
    }

    fn device(&self) -> DeviceProfile {
        self.device.lock().clone()
    }

    fn check_install_allowed(&self) -> Result<(), InstallError> {
        if self.disallow_install.load(Ordering::SeqCst) {
            return Err(InstallError::PolicyRestricted("installs disallowed".to_string()));
        }
        Ok(())
    }

    fn check_uninstall_allowed(&self) -> Result<(), InstallError> {
        if self.disallow_uninstall.load(Ordering::SeqCst) {
            return Err(InstallError::PolicyRestricted("uninstalls disallowed".to_string()));
        }
        Ok(())
    }

    async fn install(
        &self,
        id: &str,
        version_code: u64,
        files: Vec<StagedFile>,
    ) -> Result<(), InstallError> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        assert!(
            !self.panic_on_install.load(Ordering::SeqCst),
            "host install crashed"
        );
        if let Some(err) = self.install_error.lock().clone() {
            return Err(err);
        }
        self.staged.lock().insert(id.to_string(), files);
        self.packages.lock().insert(
            id.to_string(),
            InstalledPackage {
                version_code,
                enabled: true,
            },
        );
        Ok(())
    }

    async fn uninstall(&self, id: &str) -> Result<(), InstallError> {
        self.uninstall_calls.fetch_add(1, Ordering::SeqCst);
        self.packages
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| InstallError::ArtifactNotFound(format!("{id} not installed")))
    }

    async fn launch(&self, id: &str) -> Result<(), InstallError> {
        match self.package(id) {
            Some(pkg) if pkg.enabled => Ok(()),
            _ => Err(InstallError::LaunchUnavailable(LaunchTarget::App)),
        }
    }

    async fn open_app_info(&self, id: &str) -> Result<(), InstallError> {
        self.package(id)
            .map(|_| ())
            .ok_or(InstallError::LaunchUnavailable(LaunchTarget::AppInfo))
    }
}
