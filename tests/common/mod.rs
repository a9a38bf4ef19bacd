//! Shared fixtures: a repository mirror and config directory on a temp dir.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use storekeep::app::Runtime;
use storekeep::config::Settings;
use storekeep::install::verify::sha256_hex;
use storekeep::sources::RepoIndex;
use storekeep::state::{AppMetadata, ArtifactFile, ArtifactVariant, RemoteAppInfo};

/// What: Build bytes that pass the structural package check.
///
/// Inputs:
/// - `seed`: Payload distinguishing releases
///
/// Output:
/// - ZIP-headed bytes
pub fn package_bytes(seed: &str) -> Vec<u8> {
    let mut bytes = b"PK\x03\x04".to_vec();
    bytes.extend(seed.repeat(200).into_bytes());
    bytes
}

/// Temp directory holding `mirror/` and `config/`.
pub struct Fixture {
    /// Owns every file below.
    dir: tempfile::TempDir,
}

impl Fixture {
    /// What: Create an empty mirror and config directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("mirror")).expect("mirror dir");
        fs::create_dir_all(dir.path().join("config")).expect("config dir");
        let fixture = Self { dir };
        fixture.write_index(&RepoIndex::default());
        fixture
    }

    /// Mirror root.
    pub fn mirror(&self) -> PathBuf {
        self.dir.path().join("mirror")
    }

    /// Configuration directory.
    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    /// Audit logs directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.config_dir().join("logs")
    }

    /// Installed files of `id` below the default device root.
    pub fn installed_file(&self, id: &str, name: &str) -> PathBuf {
        self.config_dir()
            .join("device")
            .join("packages")
            .join(id)
            .join(name)
    }

    fn write_index(&self, index: &RepoIndex) {
        let body = serde_json::to_vec_pretty(index).expect("encode index");
        fs::write(self.mirror().join("repodata.json"), body).expect("write index");
    }

    fn read_index(&self) -> RepoIndex {
        let body = fs::read(self.mirror().join("repodata.json")).expect("read index");
        serde_json::from_slice(&body).expect("decode index")
    }

    /// What: Publish a release of `id` to the mirror.
    ///
    /// Inputs:
    /// - `id`, `version_code`, `min_sdk`: Release fields
    /// - `files`: `(name, bytes)` artifact files; sizes and digests are computed
    ///
    /// Details:
    /// - Adds `id` to the app list on first publish; later publishes only
    ///   replace the release info and add the new artifact directory.
    pub fn publish(&self, id: &str, version_code: u64, min_sdk: u32, files: &[(&str, &[u8])]) {
        let info = RemoteAppInfo {
            version: format!("1.{version_code}"),
            version_code,
            min_sdk,
            short_description: None,
            variants: vec![ArtifactVariant {
                abi: None,
                files: files
                    .iter()
                    .map(|(name, bytes)| ArtifactFile {
                        name: (*name).to_string(),
                        size: bytes.len() as u64,
                        sha256: sha256_hex(bytes),
                    })
                    .collect(),
            }],
        };
        self.publish_info(id, &info, files);
    }

    /// Publish explicit release info and served bytes, which may disagree.
    pub fn publish_info(&self, id: &str, info: &RemoteAppInfo, served: &[(&str, &[u8])]) {
        let app_dir = self.mirror().join("apps").join(id);
        let release_dir = app_dir.join(info.version_code.to_string());
        fs::create_dir_all(&release_dir).expect("release dir");
        for (name, bytes) in served {
            fs::write(release_dir.join(name), bytes).expect("write artifact");
        }
        let body = serde_json::to_vec_pretty(info).expect("encode info");
        fs::write(app_dir.join("repodata.json"), body).expect("write info");

        let mut index = self.read_index();
        if !index.apps.iter().any(|a| a.id == id) {
            index.apps.push(AppMetadata {
                id: id.to_string(),
                name: format!("App {id}"),
            });
            self.write_index(&index);
        }
    }

    /// Settings pointing at the mirror with default preferences.
    pub fn settings(&self) -> Settings {
        Settings {
            repository_url: self.mirror().display().to_string(),
            ..Settings::default()
        }
    }

    /// Runtime over `settings` using this fixture's config directory.
    pub fn runtime(&self, settings: Settings) -> Runtime {
        Runtime::from_settings(settings, &self.config_dir()).expect("runtime")
    }

    /// Runtime with default settings, after an initial repository refresh.
    pub async fn refreshed_runtime(&self) -> Runtime {
        let rt = self.runtime(self.settings());
        rt.coordinator().refresh_repo_data().await;
        rt
    }
}

/// Read a log file, empty when missing.
pub fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}
