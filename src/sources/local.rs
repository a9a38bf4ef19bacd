//! Repository served from a mirror directory on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ChunkSink, INDEX_PATH, RepoDataRepository, RepoIndex, TrustedIndex};
use crate::install::InstallError;
use crate::state::{AppMetadata, ArtifactFile, RemoteAppInfo};

/// Chunk size used when replaying a local file as a download.
const CHUNK_SIZE: usize = 64 * 1024;

/// Repository rooted at a local directory (a mounted mirror or test fixture).
pub struct LocalRepository {
    /// Mirror root.
    root: PathBuf,
    /// Trusted app list, filled by [`RepoDataRepository::fetch_repo_data`].
    index: TrustedIndex,
}

impl LocalRepository {
    /// What: Open a mirror directory.
    ///
    /// Inputs:
    /// - `root`: Mirror root directory
    /// - `cache_path`: Optional trusted-index cache file
    ///
    /// Output:
    /// - Repository whose app list is the cached one until the first refresh.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, cache_path: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: TrustedIndex::load(cache_path),
        }
    }

    /// Mirror root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file below the root off the async executor.
    async fn read(&self, rel: &str) -> Result<Vec<u8>, InstallError> {
        let path = self.root.join(rel);
        tokio::task::spawn_blocking(move || std::fs::read(&path))
            .await
            .map_err(|e| InstallError::MalformedPackage(format!("read task failed: {e}")))?
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    InstallError::ArtifactNotFound(format!("{rel} not found in mirror"))
                }
                _ => InstallError::from(e),
            })
    }
}

#[async_trait]
impl RepoDataRepository for LocalRepository {
    async fn get_apps(&self) -> Vec<AppMetadata> {
        self.index.apps()
    }

    async fn get_app(&self, id: &str) -> Option<AppMetadata> {
        self.index.get(id)
    }

    async fn get_app_repo_data(&self, id: &str) -> Result<RemoteAppInfo, InstallError> {
        let bytes = self.read(&super::app_info_path(id)?).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn fetch_repo_data(&self) -> Result<(), InstallError> {
        let bytes = self.read(INDEX_PATH).await?;
        let index: RepoIndex = serde_json::from_slice(&bytes)?;
        tracing::info!(root = %self.root.display(), apps = index.apps.len(), "mirror index loaded");
        self.index.replace(index)
    }

    async fn fetch_artifact(
        &self,
        id: &str,
        version_code: u64,
        file: &ArtifactFile,
        on_chunk: ChunkSink<'_>,
    ) -> Result<Vec<u8>, InstallError> {
        let bytes = self
            .read(&super::artifact_path(id, version_code, &file.name)?)
            .await?;
        for chunk in bytes.chunks(CHUNK_SIZE) {
            on_chunk(chunk.len());
        }
        Ok(bytes)
    }
}
