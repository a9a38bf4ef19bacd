//! Affordances a screen offers for one package.

use crate::state::{DownloadProgress, InstallStatus};

/// Main button of a package screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryAction {
    /// Start an install.
    Install,
    /// Start an update.
    Update,
    /// Open the OS app-info page so the user can enable the app.
    Enable,
    /// Launch the app.
    Open,
    /// An install is running; shows progress instead of a label.
    Busy,
    /// Status not resolved yet.
    Unknown,
}

impl PrimaryAction {
    /// CLI label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Update => "update",
            Self::Enable => "enable",
            Self::Open => "open",
            Self::Busy => "busy",
            Self::Unknown => "unknown",
        }
    }
}

/// Inputs of [`install_actions`].
#[derive(Clone, Copy, Debug)]
pub struct ActionContext<'a> {
    /// Package the screen shows.
    pub id: &'a str,
    /// Current registry status.
    pub status: InstallStatus,
    /// Current download progress, if bytes are transferring.
    pub progress: Option<DownloadProgress>,
    /// Minimum SDK of the latest release.
    pub min_sdk: u32,
    /// Device SDK level.
    pub device_sdk: u32,
    /// The running client's own package id.
    pub self_package_id: Option<&'a str>,
}

/// What a screen should offer for one package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallActions {
    /// Incompatibility message; when set nothing else is offered.
    pub incompatible: Option<String>,
    /// Main button, `None` when hidden.
    pub primary: Option<PrimaryAction>,
    /// Whether the main button accepts input.
    pub primary_enabled: bool,
    /// Whether an uninstall button is offered.
    pub uninstall: bool,
    /// Download progress to render.
    pub progress: Option<DownloadProgress>,
    /// `Loading` without a progress entry yet.
    pub waiting_for_size: bool,
}

/// What: Compute the affordances for one package.
///
/// Inputs:
/// - `ctx`: Status, progress, SDK levels and self package id
///
/// Output:
/// - `InstallActions` for the screen to render.
///
/// Details:
/// - The self package never offers uninstall and hides "open" once installed.
/// - The primary button is disabled while downloading or waiting for size.
#[must_use]
pub fn install_actions(ctx: &ActionContext<'_>) -> InstallActions {
    if ctx.min_sdk > ctx.device_sdk {
        return InstallActions {
            incompatible: Some(format!(
                "This app requires SDK {} but the device has {}",
                ctx.min_sdk, ctx.device_sdk
            )),
            primary: None,
            primary_enabled: false,
            uninstall: false,
            progress: None,
            waiting_for_size: false,
        };
    }
    let is_self = ctx.self_package_id == Some(ctx.id);
    let downloading = ctx.progress.is_some();
    let waiting_for_size = ctx.status == InstallStatus::Loading && !downloading;
    let primary = match ctx.status {
        InstallStatus::Installable => Some(PrimaryAction::Install),
        InstallStatus::Updatable => Some(PrimaryAction::Update),
        InstallStatus::Disabled => Some(PrimaryAction::Enable),
        InstallStatus::Installed if is_self => None,
        InstallStatus::Installed => Some(PrimaryAction::Open),
        InstallStatus::Loading => Some(PrimaryAction::Busy),
        InstallStatus::Unknown => Some(PrimaryAction::Unknown),
    };
    InstallActions {
        incompatible: None,
        primary,
        primary_enabled: primary.is_some() && !downloading && !waiting_for_size,
        uninstall: ctx.status.is_present() && !is_self,
        progress: ctx.progress,
        waiting_for_size,
    }
}
