use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{self, Settings};
use crate::install::{DirectoryHost, InstallError, PackageHost, PackageInstaller};
use crate::jobs::{JobConstraints, JobSettings};
use crate::logic::InstallCoordinator;
use crate::sources::{HttpRepository, LocalRepository, RepoDataRepository};
use crate::state::{AppMetadata, InstallStatus, InstallStatusRegistry};

/// What: Open the repository named by `location`.
///
/// Inputs:
/// - `location`: `http(s)://` base URL, `file://` URL or plain directory path
/// - `cache_path`: Trusted-index cache file
///
/// Output:
/// - HTTP repository for URLs, local mirror otherwise.
///
/// # Errors
/// - `NetworkUnreachable` when the HTTP client cannot be built.
pub fn open_repository(
    location: &str,
    cache_path: Option<PathBuf>,
) -> Result<Arc<dyn RepoDataRepository>, InstallError> {
    let location = location.trim();
    if location.starts_with("https://") || location.starts_with("http://") {
        debug!(url = %location, "using HTTP repository");
        return Ok(Arc::new(HttpRepository::new(location, cache_path)?));
    }
    let root = location.strip_prefix("file://").unwrap_or(location);
    debug!(root = %root, "using local mirror repository");
    Ok(Arc::new(LocalRepository::new(root, cache_path)))
}

/// One line of the app listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppRow {
    /// Trusted metadata.
    pub app: AppMetadata,
    /// Resolved status.
    pub status: InstallStatus,
    /// Latest version name, when release info was available.
    pub version: Option<String>,
}

/// Shared components for one process.
pub struct Runtime {
    /// Effective settings (after CLI overrides).
    settings: Settings,
    /// Configuration directory.
    config_dir: PathBuf,
    /// Repository used by the installer.
    repo: Arc<dyn RepoDataRepository>,
    /// Device host.
    host: Arc<DirectoryHost>,
    /// Coordinator shared by CLI actions and background jobs.
    coordinator: Arc<InstallCoordinator>,
}

impl Runtime {
    /// What: Load `settings.conf` from `config_dir` and build the runtime.
    ///
    /// Inputs:
    /// - `config_dir`: Configuration directory
    /// - `repo_override`: `--repo` value replacing `repository_url`
    ///
    /// # Errors
    /// - See [`Runtime::from_settings`].
    pub fn init(config_dir: &Path, repo_override: Option<&str>) -> Result<Self, InstallError> {
        let mut settings = config::load_settings(&config::settings_path(config_dir));
        if let Some(repo) = repo_override.filter(|r| !r.trim().is_empty()) {
            settings.repository_url = repo.trim().to_string();
        }
        Self::from_settings(settings, config_dir)
    }

    /// What: Build every component from already loaded settings.
    ///
    /// Inputs:
    /// - `settings`: Effective settings
    /// - `config_dir`: Directory holding the index cache, logs and default device root
    ///
    /// # Errors
    /// - `NetworkUnreachable` when an HTTP repository cannot be set up.
    pub fn from_settings(settings: Settings, config_dir: &Path) -> Result<Self, InstallError> {
        let repo = open_repository(
            &settings.repository_url,
            Some(config::index_cache_path(config_dir)),
        )?;
        let device_root = settings
            .device_root
            .clone()
            .unwrap_or_else(|| config::default_device_root(config_dir));
        let host = Arc::new(DirectoryHost::new(
            device_root.clone(),
            settings.device_profile(),
            settings.host_policy(),
        ));
        let package_host: Arc<dyn PackageHost> = host.clone();
        let installer = Arc::new(
            PackageInstaller::new(Arc::clone(&repo), package_host)
                .with_audit_dir(config::logs_dir(config_dir)),
        );
        let coordinator = Arc::new(InstallCoordinator::new(
            Arc::new(InstallStatusRegistry::new()),
            installer,
            settings.install_policy(),
        ));
        info!(
            repository = %settings.repository_url,
            device_root = %device_root.display(),
            sdk = settings.device_sdk,
            privileged = settings.privileged_installer,
            "runtime initialized"
        );
        Ok(Self {
            settings,
            config_dir: config_dir.to_path_buf(),
            repo,
            host,
            coordinator,
        })
    }

    /// Effective settings.
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Configuration directory.
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<InstallStatusRegistry> {
        self.coordinator.registry()
    }

    /// Device host.
    #[must_use]
    pub const fn host(&self) -> &Arc<DirectoryHost> {
        &self.host
    }

    /// Shared coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &Arc<InstallCoordinator> {
        &self.coordinator
    }

    /// Job settings derived from the preferences.
    #[must_use]
    pub const fn job_settings(&self) -> JobSettings {
        JobSettings {
            constraints: JobConstraints {
                network: self.settings.updater_network_type,
            },
            automatic_updates: self.settings.automatic_updates,
        }
    }

    /// Time between background job runs.
    #[must_use]
    pub const fn job_period(&self) -> Duration {
        let hours = if self.settings.auto_update_interval_hours == 0 {
            1
        } else {
            self.settings.auto_update_interval_hours
        };
        Duration::from_secs(hours.saturating_mul(3600))
    }

    /// What: Resolve and list every trusted app.
    ///
    /// Output:
    /// - One row per app in repository order; apps whose status cannot be
    ///   resolved are listed as `Unknown`.
    pub async fn app_rows(&self) -> Vec<AppRow> {
        let mut rows = Vec::new();
        for app in self.repo.get_apps().await {
            let status = self
                .coordinator
                .resolve_status(&app.id)
                .await
                .unwrap_or_default();
            let version = self.coordinator.release_info(&app.id).map(|i| i.version);
            rows.push(AppRow {
                app,
                status,
                version,
            });
        }
        rows
    }
}
