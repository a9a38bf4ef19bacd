//! Core value types used by storekeep state.

use std::fmt;

/// Install lifecycle state of one package.
///
/// A package id that has never been resolved is treated as [`InstallStatus::Unknown`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    /// Not resolved yet, or the host could not be queried.
    #[default]
    Unknown,
    /// An install or update is running.
    Loading,
    /// Not installed on the device.
    Installable,
    /// Installed at the latest (or a newer) version.
    Installed,
    /// Installed, but the repository offers a newer version.
    Updatable,
    /// Installed but disabled by the user or the OS.
    Disabled,
}

impl InstallStatus {
    /// All statuses, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::Loading,
        Self::Installable,
        Self::Installed,
        Self::Updatable,
        Self::Disabled,
    ];

    /// Whether the package is present on the device in any form.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Installed | Self::Updatable | Self::Disabled)
    }

    /// Whether an install (or update) may be started from this status.
    #[must_use]
    pub const fn accepts_install(self) -> bool {
        matches!(self, Self::Installable | Self::Updatable)
    }

    /// Short label used by the CLI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Loading => "loading",
            Self::Installable => "installable",
            Self::Installed => "installed",
            Self::Updatable => "updatable",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bytes fetched against bytes expected for one in-flight download.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DownloadProgress {
    /// Bytes fetched so far.
    pub part: u64,
    /// Expected total size in bytes.
    pub total: u64,
}

impl DownloadProgress {
    /// What: Build a progress value, clamping `part` to `total`.
    ///
    /// Inputs:
    /// - `part`: Bytes fetched so far
    /// - `total`: Expected size in bytes
    ///
    /// Output:
    /// - `DownloadProgress` honouring `part <= total`
    #[must_use]
    pub const fn new(part: u64, total: u64) -> Self {
        let part = if part > total { total } else { part };
        Self { part, total }
    }

    /// Completed fraction in `0.0..=1.0`; `0.0` while the total is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            (self.part as f64 / self.total as f64) as f32
        }
    }

    /// Whether every expected byte has arrived.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        self.part == self.total
    }
}

impl fmt::Display for DownloadProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::util::format_progress_mb(self.part, self.total))
    }
}

/// Trusted, locally verified information about an app.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AppMetadata {
    /// Package id.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// One downloadable file of an artifact variant.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArtifactFile {
    /// File name, relative to the version directory in the repository.
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
}

/// Set of files making up an install for one device ABI.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArtifactVariant {
    /// Target ABI; `None` matches every device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<String>,
    /// Files handed to the host installer together.
    pub files: Vec<ArtifactFile>,
}

impl ArtifactVariant {
    /// Sum of the declared file sizes; `None` when it does not fit in a `u64`.
    #[must_use]
    pub fn total_size(&self) -> Option<u64> {
        self.files
            .iter()
            .try_fold(0u64, |acc, f| acc.checked_add(f.size))
    }
}

/// Untrusted, remotely fetched details of the latest release of an app.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoteAppInfo {
    /// Human readable version name.
    pub version: String,
    /// Monotonic version code used for update detection.
    pub version_code: u64,
    /// Minimum platform SDK level required.
    #[serde(default)]
    pub min_sdk: u32,
    /// Optional one-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    /// Artifact variants, one per supported ABI.
    #[serde(default)]
    pub variants: Vec<ArtifactVariant>,
}

impl RemoteAppInfo {
    /// What: Pick the variant for a device.
    ///
    /// Inputs:
    /// - `abis`: Device ABIs in preference order
    ///
    /// Output:
    /// - The first variant whose ABI matches, walking the device preference
    ///   order; an ABI-less variant is used only when no specific one matches.
    #[must_use]
    pub fn select_variant(&self, abis: &[String]) -> Option<&ArtifactVariant> {
        abis.iter()
            .find_map(|abi| {
                self.variants
                    .iter()
                    .find(|v| v.abi.as_deref() == Some(abi.as_str()))
            })
            .or_else(|| self.variants.iter().find(|v| v.abi.is_none()))
    }
}
