//! Repository data retrieval split into submodules.
//!
//! [`RepoDataRepository`] is the seam the installer and coordinator depend on.
//! Two implementations ship: [`HttpRepository`] for remote repositories and
//! [`LocalRepository`] for mirror directories on disk. Both share the layout:
//!
//! - `repodata.json`: the trusted app list
//! - `apps/<id>/repodata.json`: latest release info of one app
//! - `apps/<id>/<version_code>/<file>`: artifact bytes

use async_trait::async_trait;

use crate::install::InstallError;
use crate::state::{AppMetadata, ArtifactFile, RemoteAppInfo};

mod http;
mod index;
mod local;

pub use http::HttpRepository;
pub use index::{RepoIndex, TrustedIndex};
pub use local::LocalRepository;

/// Callback receiving the length of every chunk as it arrives.
pub type ChunkSink<'a> = &'a mut (dyn FnMut(usize) + Send);

/// Source of app metadata and artifacts.
#[async_trait]
pub trait RepoDataRepository: Send + Sync {
    /// Trusted app list from the local cache.
    async fn get_apps(&self) -> Vec<AppMetadata>;

    /// Trusted metadata of `id`; `None` when the app is not in the repository.
    async fn get_app(&self, id: &str) -> Option<AppMetadata>;

    /// Latest release info of `id` from the remote side.
    async fn get_app_repo_data(&self, id: &str) -> Result<RemoteAppInfo, InstallError>;

    /// Refresh the trusted app list from the remote side.
    async fn fetch_repo_data(&self) -> Result<(), InstallError>;

    /// Download one artifact file, reporting each chunk to `on_chunk`.
    async fn fetch_artifact(
        &self,
        id: &str,
        version_code: u64,
        file: &ArtifactFile,
        on_chunk: ChunkSink<'_>,
    ) -> Result<Vec<u8>, InstallError>;
}

/// Relative path of the app list.
pub const INDEX_PATH: &str = "repodata.json";

/// What: Reject path segments that could escape the repository root.
///
/// Inputs:
/// - `segment`: Package id or file name taken from repository data
///
/// Output:
/// - The segment unchanged when safe.
///
/// # Errors
/// - `DecodeFailure` for empty segments, separators, or `.`/`..`.
pub fn checked_segment(segment: &str) -> Result<&str, InstallError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.contains('\0')
    {
        return Err(InstallError::DecodeFailure(format!(
            "invalid path segment {segment:?}"
        )));
    }
    Ok(segment)
}

/// Relative path of the release info of `id`.
///
/// # Errors
/// - `DecodeFailure` when `id` is not a safe path segment.
pub fn app_info_path(id: &str) -> Result<String, InstallError> {
    Ok(format!("apps/{}/repodata.json", checked_segment(id)?))
}

/// Relative path of one artifact file.
///
/// # Errors
/// - `DecodeFailure` when `id` or the file name is not a safe path segment.
pub fn artifact_path(id: &str, version_code: u64, name: &str) -> Result<String, InstallError> {
    Ok(format!(
        "apps/{}/{version_code}/{}",
        checked_segment(id)?,
        checked_segment(name)?
    ))
}
