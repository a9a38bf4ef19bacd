//! Install subsystem.
//!
//! Splits the download/verify/hand-off pipeline into focused submodules:
//! the error taxonomy, the host seam, integrity checks, the installer itself
//! and a directory-backed host used by the CLI and the tests.

pub mod directory_host;
pub mod error;
pub mod host;
pub mod installer;
mod logging;
pub mod verify;

pub use directory_host::{DirectoryHost, HostPolicy};
pub use error::{ErrorKind, InstallError, LaunchTarget};
pub use host::{
    DeviceProfile, InstalledPackage, PackageHost, StagedFile, package_install_status, status_for,
};
pub use installer::{InstallOutcome, PackageInstaller};
