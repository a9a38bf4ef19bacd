//! Trusted app list cache shared by the repository implementations.

use std::fs;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::install::InstallError;
use crate::state::AppMetadata;

/// On-disk and wire form of the app list.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RepoIndex {
    /// Every app the repository offers.
    #[serde(default)]
    pub apps: Vec<AppMetadata>,
}

/// In-memory app list, optionally persisted to a cache file.
pub struct TrustedIndex {
    /// Current app list.
    apps: RwLock<Vec<AppMetadata>>,
    /// Where the list is persisted between runs.
    cache_path: Option<PathBuf>,
}

impl TrustedIndex {
    /// What: Create the index, seeding it from the cache file when readable.
    ///
    /// Inputs:
    /// - `cache_path`: Optional persistence file
    ///
    /// Output:
    /// - Index holding the cached list, or empty.
    ///
    /// Details:
    /// - A missing or corrupt cache file yields an empty list; the next
    ///   repository refresh rewrites it.
    #[must_use]
    pub fn load(cache_path: Option<PathBuf>) -> Self {
        let apps = cache_path
            .as_ref()
            .and_then(|p| fs::read(p).ok())
            .and_then(|bytes| match serde_json::from_slice::<RepoIndex>(&bytes) {
                Ok(index) => Some(index.apps),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring corrupt repository cache");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            apps: RwLock::new(apps),
            cache_path,
        }
    }

    /// Copy of the current list.
    #[must_use]
    pub fn apps(&self) -> Vec<AppMetadata> {
        self.apps.read().clone()
    }

    /// Metadata of `id`, if listed.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<AppMetadata> {
        self.apps.read().iter().find(|a| a.id == id).cloned()
    }

    /// What: Swap in a freshly fetched list and persist it.
    ///
    /// # Errors
    /// - I/O failures writing the cache file, mapped through `InstallError::from`.
    pub fn replace(&self, index: RepoIndex) -> Result<(), InstallError> {
        if let Some(path) = &self.cache_path {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, serde_json::to_vec_pretty(&index)?)?;
        }
        tracing::debug!(apps = index.apps.len(), "trusted index replaced");
        *self.apps.write() = index.apps;
        Ok(())
    }
}
