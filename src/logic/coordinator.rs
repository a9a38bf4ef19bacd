//! Per-screen install orchestration.
//!
//! An [`InstallCoordinator`] sits between a screen and the shared
//! [`InstallStatusRegistry`]: it resolves statuses, applies install policy
//! (confirmation gating, the self-package guard and the SDK gate), drives the
//! [`PackageInstaller`] and turns every failure into a single message in its
//! last-error slot. Installs run on detached tasks so they outlive the screen
//! that started them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::actions::{ActionContext, InstallActions, install_actions};
use crate::install::{
    InstallError, InstallOutcome, LaunchTarget, PackageInstaller, package_install_status,
};
use crate::state::{InstallStatus, InstallStatusRegistry, RemoteAppInfo};

/// Policy knobs applied by the coordinator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstallPolicy {
    /// Ask for confirmation before silent (privileged) installs and uninstalls.
    pub require_user_action: bool,
    /// The running client's own package id.
    pub self_package_id: Option<String>,
}

/// Action waiting for [`InstallCoordinator::confirm`] or [`InstallCoordinator::dismiss`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    /// Install or update `id`.
    Install {
        /// Package id.
        id: String,
    },
    /// Uninstall `id`.
    Uninstall {
        /// Package id.
        id: String,
    },
}

impl PendingAction {
    /// Package the action targets.
    #[must_use]
    pub fn package_id(&self) -> &str {
        match self {
            Self::Install { id } | Self::Uninstall { id } => id,
        }
    }
}

/// Handle to a running install.
///
/// Dropping it detaches the task; the install still runs to completion.
#[derive(Debug)]
pub struct InstallTask {
    /// Package being installed.
    id: String,
    /// Task driving the installer.
    handle: JoinHandle<Result<InstallOutcome, InstallError>>,
}

impl InstallTask {
    /// Package being installed.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// What: Wait for the install to finish.
    ///
    /// Output:
    /// - The installer result, or `None` if the task was cancelled or panicked.
    pub async fn wait(self) -> Option<Result<InstallOutcome, InstallError>> {
        match self.handle.await {
            Ok(result) => Some(result),
            Err(e) => {
                error!(id = %self.id, error = %e, "install task did not finish");
                None
            }
        }
    }
}

/// Puts a package back to its pre-install status unless disarmed.
///
/// Owned by the install task, so it also runs when the task panics or is
/// dropped before finishing.
struct RestoreGuard {
    /// Registry to restore.
    registry: Arc<InstallStatusRegistry>,
    /// Package being installed.
    id: String,
    /// Status before the install started.
    previous: InstallStatus,
    /// Cleared once the install succeeded.
    armed: bool,
}

impl RestoreGuard {
    /// Keep the status the install produced.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.registry.clear_progress(&self.id);
        if self
            .registry
            .set_if(&self.id, InstallStatus::Loading, self.previous)
        {
            debug!(id = %self.id, status = %self.previous, "pre-install status restored");
        }
    }
}

/// Result of a coordinator entry point.
#[derive(Debug)]
pub enum ActionOutcome {
    /// An install task was started.
    Started(InstallTask),
    /// The action waits for an explicit confirmation.
    AwaitingConfirmation(PendingAction),
    /// The action completed.
    Done,
    /// Not applicable in the current status; nothing happened.
    Ignored,
    /// Refused by policy before anything ran.
    Rejected,
    /// The action ran and failed; see the last-error slot.
    Failed,
}

/// Orchestrates installs, uninstalls and launches for one screen.
pub struct InstallCoordinator {
    /// Shared status/progress registry.
    registry: Arc<InstallStatusRegistry>,
    /// Shared installer (owns the in-flight set).
    installer: Arc<PackageInstaller>,
    /// Confirmation and self-package rules.
    policy: InstallPolicy,
    /// Latest release info seen per package.
    releases: Mutex<HashMap<String, RemoteAppInfo>>,
    /// Message of the last failure, shared with install tasks.
    last_error: Arc<Mutex<Option<InstallError>>>,
    /// Action awaiting confirmation.
    pending: Mutex<Option<PendingAction>>,
}

impl InstallCoordinator {
    /// Create a coordinator over the shared registry and installer.
    #[must_use]
    pub fn new(
        registry: Arc<InstallStatusRegistry>,
        installer: Arc<PackageInstaller>,
        policy: InstallPolicy,
    ) -> Self {
        Self {
            registry,
            installer,
            policy,
            releases: Mutex::new(HashMap::new()),
            last_error: Arc::new(Mutex::new(None)),
            pending: Mutex::new(None),
        }
    }

    /// Registry this coordinator writes to.
    #[must_use]
    pub fn registry(&self) -> &Arc<InstallStatusRegistry> {
        &self.registry
    }

    /// Active policy.
    #[must_use]
    pub const fn policy(&self) -> &InstallPolicy {
        &self.policy
    }

    /// Whether installs and uninstalls currently need [`Self::confirm`].
    #[must_use]
    pub fn requires_confirmation(&self) -> bool {
        self.policy.require_user_action && self.installer.host().device().privileged
    }

    /// Whether `id` is the running client itself.
    fn is_self(&self, id: &str) -> bool {
        self.policy.self_package_id.as_deref() == Some(id)
    }

    /// Last failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<InstallError> {
        self.last_error.lock().clone()
    }

    /// Take the last failure once it was displayed.
    pub fn take_error(&self) -> Option<InstallError> {
        self.last_error.lock().take()
    }

    /// Clear the error slot at the start of a user action.
    fn clear_error(&self) {
        *self.last_error.lock() = None;
    }

    /// Log `err` and store it in the error slot.
    fn fail(&self, id: &str, err: InstallError) {
        warn!(id = %id, kind = ?err.kind(), error = %err, "action failed");
        *self.last_error.lock() = Some(err);
    }

    /// Latest release info seen for `id`.
    #[must_use]
    pub fn release_info(&self, id: &str) -> Option<RemoteAppInfo> {
        self.releases.lock().get(id).cloned()
    }

    /// Fetch release info for `id` and remember it.
    async fn fetch_release(&self, id: &str) -> Result<RemoteAppInfo, InstallError> {
        let info = self.installer.repo().get_app_repo_data(id).await?;
        self.releases.lock().insert(id.to_string(), info.clone());
        Ok(info)
    }

    /// Query the host; failures count as `Unknown`.
    async fn host_status(&self, id: &str, latest: Option<u64>) -> InstallStatus {
        match package_install_status(self.installer.host().as_ref(), id, latest).await {
            Ok(status) => status,
            Err(e) => {
                warn!(id = %id, error = %e, "host status query failed");
                InstallStatus::Unknown
            }
        }
    }

    /// What: Resolve the status of one package the first time a screen shows it.
    ///
    /// Inputs:
    /// - `id`: Package id
    ///
    /// Output:
    /// - `None` when the repository does not know `id`; otherwise the status.
    ///
    /// Details:
    /// - Already resolved statuses are returned unchanged.
    /// - Release info failures land in the error slot and leave the status as is.
    pub async fn resolve_status(&self, id: &str) -> Option<InstallStatus> {
        self.clear_error();
        if let Some(status) = self.registry.resolved(id) {
            return Some(status);
        }
        let Some(app) = self.installer.repo().get_app(id).await else {
            debug!(id = %id, "package not in repository");
            return None;
        };
        match self.fetch_release(&app.id).await {
            Ok(info) => {
                let status = self.host_status(id, Some(info.version_code)).await;
                if self.registry.set_if(id, InstallStatus::Unknown, status) {
                    Some(status)
                } else {
                    Some(self.registry.get(id))
                }
            }
            Err(e) => {
                self.fail(id, e);
                Some(self.registry.get(id))
            }
        }
    }

    /// What: Re-derive the status of every trusted app from the host.
    ///
    /// Details:
    /// - Packages with an install running are left alone.
    /// - The derived status is dropped when the registry changed while the
    ///   host was queried.
    /// - A failing release lookup only drops the update check for that app.
    pub async fn refresh_statuses(&self) {
        self.clear_error();
        let apps = self.installer.repo().get_apps().await;
        for app in apps {
            let before = self.registry.get(&app.id);
            if self.installer.is_in_flight(&app.id) || before == InstallStatus::Loading {
                continue;
            }
            let latest = match self.fetch_release(&app.id).await {
                Ok(info) => Some(info.version_code),
                Err(e) => {
                    debug!(id = %app.id, error = %e, "release info unavailable");
                    None
                }
            };
            let status = self.host_status(&app.id, latest).await;
            if !self.registry.set_if(&app.id, before, status) {
                debug!(id = %app.id, derived = %status, "status changed during refresh; keeping it");
            }
        }
    }

    /// What: Refresh the trusted app list, then every status.
    ///
    /// Output:
    /// - `Done`, or `Failed` with the error in the slot.
    pub async fn refresh_repo_data(&self) -> ActionOutcome {
        self.clear_error();
        if let Err(e) = self.installer.repo().fetch_repo_data().await {
            warn!(kind = ?e.kind(), error = %e, "repository refresh failed");
            *self.last_error.lock() = Some(e);
            return ActionOutcome::Failed;
        }
        self.refresh_statuses().await;
        ActionOutcome::Done
    }

    /// Affordances for `id` given the minimum SDK of its latest release.
    #[must_use]
    pub fn actions(&self, id: &str, min_sdk: u32) -> InstallActions {
        install_actions(&ActionContext {
            id,
            status: self.registry.get(id),
            progress: self.registry.progress(id),
            min_sdk,
            device_sdk: self.installer.host().device().sdk,
            self_package_id: self.policy.self_package_id.as_deref(),
        })
    }

    /// What: Install or update `id`.
    ///
    /// Output:
    /// - `Ignored` unless the status is `Installable` or `Updatable`.
    /// - `Rejected` when the release needs a newer SDK (message in the slot).
    /// - `AwaitingConfirmation` in privileged mode with `require_user_action`.
    /// - `Started` otherwise.
    pub async fn install(&self, id: &str) -> ActionOutcome {
        self.clear_error();
        if !self.registry.get(id).accepts_install() {
            debug!(id = %id, status = %self.registry.get(id), "install ignored");
            return ActionOutcome::Ignored;
        }
        let info = match self.release_info(id) {
            Some(info) => info,
            None => match self.fetch_release(id).await {
                Ok(info) => info,
                Err(e) => {
                    self.fail(id, e);
                    return ActionOutcome::Failed;
                }
            },
        };
        let device_sdk = self.installer.host().device().sdk;
        if info.min_sdk > device_sdk {
            self.fail(
                id,
                InstallError::UnsupportedDevice(format!(
                    "requires SDK {}, device has {device_sdk}",
                    info.min_sdk
                )),
            );
            return ActionOutcome::Rejected;
        }
        if self.requires_confirmation() {
            return self.await_confirmation(PendingAction::Install { id: id.to_string() });
        }
        self.start_install(id)
    }

    /// Park `action` until the user confirms or dismisses it.
    fn await_confirmation(&self, action: PendingAction) -> ActionOutcome {
        info!(id = %action.package_id(), ?action, "waiting for confirmation");
        *self.pending.lock() = Some(action.clone());
        ActionOutcome::AwaitingConfirmation(action)
    }

    /// What: Mark `id` as loading and spawn the installer.
    ///
    /// Details:
    /// - The switch to `Loading` only happens if nobody else changed the
    ///   status since it was read.
    /// - Progress goes straight to the registry.
    /// - Success clears progress and sets `Installed`; failure, a panic or a
    ///   cancelled task clears progress and restores the pre-install status.
    ///   Failures also fill the error slot.
    fn start_install(&self, id: &str) -> ActionOutcome {
        let previous = self.registry.get(id);
        if !previous.accepts_install() {
            return ActionOutcome::Ignored;
        }
        if !self.registry.set_if(id, previous, InstallStatus::Loading) {
            debug!(id = %id, "status changed before install could start");
            return ActionOutcome::Ignored;
        }
        let expected = self.release_info(id).map(|info| info.version_code);
        info!(id = %id, from = %previous, "install started");

        let registry = Arc::clone(&self.registry);
        let installer = Arc::clone(&self.installer);
        let last_error = Arc::clone(&self.last_error);
        let task_id = id.to_string();
        let restore = RestoreGuard {
            registry: Arc::clone(&registry),
            id: task_id.clone(),
            previous,
            armed: true,
        };
        let handle = tokio::spawn(async move {
            let progress_sink = Arc::clone(&registry);
            let progress_id = task_id.clone();
            let complete_sink = Arc::clone(&registry);
            let complete_id = task_id.clone();
            let result = installer
                .download_and_install(
                    &task_id,
                    expected,
                    move |p| progress_sink.set_progress(&progress_id, p),
                    move || {
                        complete_sink.clear_progress(&complete_id);
                        complete_sink.set(&complete_id, InstallStatus::Installed);
                    },
                )
                .await;
            match &result {
                Ok(InstallOutcome::Installed { version_code }) => {
                    info!(id = %task_id, version_code, "install finished");
                    restore.disarm();
                }
                Ok(InstallOutcome::AlreadyInProgress) => {
                    debug!(id = %task_id, "install owned by another attempt");
                    restore.disarm();
                }
                Err(e) => {
                    error!(id = %task_id, kind = ?e.kind(), error = %e, "install failed");
                    *last_error.lock() = Some(e.clone());
                    drop(restore);
                }
            }
            result
        });
        ActionOutcome::Started(InstallTask {
            id: id.to_string(),
            handle,
        })
    }

    /// What: Uninstall `id`.
    ///
    /// Output:
    /// - `Rejected` for the self package, `Ignored` unless installed in some
    ///   form, `AwaitingConfirmation` under the confirmation rule, otherwise
    ///   `Done` or `Failed`.
    pub async fn uninstall(&self, id: &str) -> ActionOutcome {
        self.clear_error();
        if self.is_self(id) {
            warn!(id = %id, "refusing to uninstall the running client");
            return ActionOutcome::Rejected;
        }
        if !self.registry.get(id).is_present() {
            debug!(id = %id, status = %self.registry.get(id), "uninstall ignored");
            return ActionOutcome::Ignored;
        }
        if self.requires_confirmation() {
            return self.await_confirmation(PendingAction::Uninstall { id: id.to_string() });
        }
        self.run_uninstall(id).await
    }

    /// Remove `id` and mark it installable.
    async fn run_uninstall(&self, id: &str) -> ActionOutcome {
        if self.is_self(id) || !self.registry.get(id).is_present() {
            return ActionOutcome::Ignored;
        }
        match self.installer.uninstall_app(id).await {
            Ok(()) => {
                self.registry.set(id, InstallStatus::Installable);
                ActionOutcome::Done
            }
            Err(e) => {
                self.fail(id, e);
                ActionOutcome::Failed
            }
        }
    }

    /// Action currently awaiting confirmation.
    #[must_use]
    pub fn pending(&self) -> Option<PendingAction> {
        self.pending.lock().clone()
    }

    /// What: Run the action awaiting confirmation.
    ///
    /// Output:
    /// - `Ignored` when nothing is pending or the status moved on meanwhile;
    ///   otherwise the outcome of the confirmed action.
    pub async fn confirm(&self) -> ActionOutcome {
        self.clear_error();
        let Some(action) = self.pending.lock().take() else {
            return ActionOutcome::Ignored;
        };
        info!(?action, "action confirmed");
        match action {
            PendingAction::Install { id } => self.start_install(&id),
            PendingAction::Uninstall { id } => self.run_uninstall(&id).await,
        }
    }

    /// Drop the action awaiting confirmation.
    pub fn dismiss(&self) -> Option<PendingAction> {
        let action = self.pending.lock().take();
        if let Some(action) = &action {
            info!(?action, "action dismissed");
        }
        action
    }

    /// What: Launch `id`.
    ///
    /// Output:
    /// - `Rejected` for the self package while it is being updated;
    ///   `Failed` with `LaunchUnavailable` when the host cannot open it.
    pub async fn open(&self, id: &str) -> ActionOutcome {
        self.clear_error();
        if self.is_self(id) && self.registry.get(id) == InstallStatus::Loading {
            return ActionOutcome::Rejected;
        }
        match self.installer.host().launch(id).await {
            Ok(()) => ActionOutcome::Done,
            Err(e) => {
                debug!(id = %id, error = %e, "launch failed");
                self.fail(id, InstallError::LaunchUnavailable(LaunchTarget::App));
                ActionOutcome::Failed
            }
        }
    }

    /// What: Open the OS app-info page of `id`; never changes the status.
    pub async fn open_app_info(&self, id: &str) -> ActionOutcome {
        self.clear_error();
        match self.installer.host().open_app_info(id).await {
            Ok(()) => ActionOutcome::Done,
            Err(e) => {
                debug!(id = %id, error = %e, "app info failed");
                self.fail(id, InstallError::LaunchUnavailable(LaunchTarget::AppInfo));
                ActionOutcome::Failed
            }
        }
    }
}
