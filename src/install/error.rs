//! Closed failure taxonomy for repository, download, verification and host calls.
//!
//! Every failing operation in the install pipeline returns an [`InstallError`].
//! The coordinator switches over [`InstallError::kind`] exhaustively and shows
//! the `Display` text as the user message.

use std::fmt;
use std::io;

/// What a launch attempt tried to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchTarget {
    /// The app's main entry point.
    App,
    /// The OS settings page for the app.
    AppInfo,
}

impl fmt::Display for LaunchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::App => f.write_str("app"),
            Self::AppInfo => f.write_str("app info"),
        }
    }
}

/// Discriminant of [`InstallError`], used for exhaustive policy decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection refused or network unreachable.
    NetworkUnreachable,
    /// DNS or host lookup failure.
    HostUnresolvable,
    /// Remote metadata or file missing.
    ArtifactNotFound,
    /// Malformed repository metadata.
    DecodeFailure,
    /// Signature, digest or size check failed.
    VerificationFailure,
    /// Downloaded artifact failed structural parsing.
    MalformedPackage,
    /// No artifact variant (or SDK level) matches the device.
    UnsupportedDevice,
    /// Device policy forbids the action.
    PolicyRestricted,
    /// Nothing can open the app or its info page.
    LaunchUnavailable,
}

/// Install pipeline error.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum InstallError {
    /// Connection refused or network unreachable.
    #[error("Network error: {0}")]
    NetworkUnreachable(String),
    /// DNS or host lookup failure.
    #[error("Unknown host: {0}")]
    HostUnresolvable(String),
    /// Remote metadata or file missing.
    #[error("Failed to download files: {0}")]
    ArtifactNotFound(String),
    /// Malformed repository metadata.
    #[error("Failed to decode repository data: {0}")]
    DecodeFailure(String),
    /// Signature, digest or size check failed.
    #[error("App verification failed: {0}")]
    VerificationFailure(String),
    /// Downloaded artifact failed structural parsing.
    #[error("Error parsing downloaded files: {0}")]
    MalformedPackage(String),
    /// No artifact variant (or SDK level) matches the device.
    #[error("This app doesn't support your device: {0}")]
    UnsupportedDevice(String),
    /// Device policy forbids the action.
    #[error("Blocked by device policy: {0}")]
    PolicyRestricted(String),
    /// Nothing can open the app or its info page.
    #[error("Couldn't open {0}")]
    LaunchUnavailable(LaunchTarget),
}

impl InstallError {
    /// Discriminant of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkUnreachable(_) => ErrorKind::NetworkUnreachable,
            Self::HostUnresolvable(_) => ErrorKind::HostUnresolvable,
            Self::ArtifactNotFound(_) => ErrorKind::ArtifactNotFound,
            Self::DecodeFailure(_) => ErrorKind::DecodeFailure,
            Self::VerificationFailure(_) => ErrorKind::VerificationFailure,
            Self::MalformedPackage(_) => ErrorKind::MalformedPackage,
            Self::UnsupportedDevice(_) => ErrorKind::UnsupportedDevice,
            Self::PolicyRestricted(_) => ErrorKind::PolicyRestricted,
            Self::LaunchUnavailable(_) => ErrorKind::LaunchUnavailable,
        }
    }

    /// Whether retrying the same action may succeed without outside changes.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Message shown to the user in the screen's error slot.
    #[must_use]
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl ErrorKind {
    /// Transport failures are retryable; everything else needs new data,
    /// a different device or a policy change.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkUnreachable | Self::HostUnresolvable)
    }
}

impl From<io::Error> for InstallError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::ArtifactNotFound(e.to_string()),
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                Self::PolicyRestricted(e.to_string())
            }
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::NetworkUnreachable
            | io::ErrorKind::HostUnreachable
            | io::ErrorKind::TimedOut => Self::NetworkUnreachable(e.to_string()),
            _ => Self::MalformedPackage(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for InstallError {
    fn from(e: serde_json::Error) -> Self {
        Self::DecodeFailure(e.to_string())
    }
}
