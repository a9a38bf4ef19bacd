//! Install state shared by every screen.
//!
//! Value types live in `types`; the process-lifetime registry that screens
//! observe lives in `registry`.

pub mod registry;
pub mod types;

pub use registry::{InstallStatusRegistry, RegistryEvent, StatusSubscription, SubscriptionError};
pub use types::{
    AppMetadata, ArtifactFile, ArtifactVariant, DownloadProgress, InstallStatus, RemoteAppInfo,
};
