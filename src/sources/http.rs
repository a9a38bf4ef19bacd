//! Repository served over HTTP(S).

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::{ChunkSink, INDEX_PATH, RepoDataRepository, RepoIndex, TrustedIndex};
use crate::install::InstallError;
use crate::state::{AppMetadata, ArtifactFile, RemoteAppInfo};

/// Remote repository reached through a pooled `reqwest` client.
pub struct HttpRepository {
    /// Shared client; connection pooling is enabled by default.
    client: reqwest::Client,
    /// Base URL without trailing slash.
    base: String,
    /// Trusted app list.
    index: TrustedIndex,
}

impl HttpRepository {
    /// What: Build a repository client for `base_url`.
    ///
    /// Inputs:
    /// - `base_url`: Repository root, e.g. `https://repo.example.org`
    /// - `cache_path`: Optional trusted-index cache file
    ///
    /// Output:
    /// - Ready repository; no request is made yet.
    ///
    /// # Errors
    /// - `NetworkUnreachable` when the HTTP client cannot be constructed.
    pub fn new(base_url: &str, cache_path: Option<PathBuf>) -> Result<Self, InstallError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .read_timeout(Duration::from_secs(30))
            .user_agent(format!("storekeep/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InstallError::NetworkUnreachable(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
            index: TrustedIndex::load(cache_path),
        })
    }

    /// Absolute URL of a repository-relative path.
    fn url(&self, rel: &str) -> String {
        format!("{}/{rel}", self.base)
    }

    /// Send a GET and fail on non-success statuses.
    async fn get(&self, rel: &str) -> Result<reqwest::Response, InstallError> {
        let url = self.url(rel);
        let resp = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, url = %url, "repository request failed");
            map_reqwest_error(&e, &url)
        })?;
        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "repository returned error status");
            return Err(map_status(status, &url));
        }
        Ok(resp)
    }

    /// GET a JSON document and decode it.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, rel: &str) -> Result<T, InstallError> {
        let url = self.url(rel);
        let body = self
            .get(rel)
            .await?
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(&e, &url))?;
        debug!(url = %url, bytes = body.len(), "fetched repository document");
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl RepoDataRepository for HttpRepository {
    async fn get_apps(&self) -> Vec<AppMetadata> {
        self.index.apps()
    }

    async fn get_app(&self, id: &str) -> Option<AppMetadata> {
        self.index.get(id)
    }

    async fn get_app_repo_data(&self, id: &str) -> Result<RemoteAppInfo, InstallError> {
        self.get_json(&super::app_info_path(id)?).await
    }

    async fn fetch_repo_data(&self) -> Result<(), InstallError> {
        let index: RepoIndex = self.get_json(INDEX_PATH).await?;
        info!(base = %self.base, apps = index.apps.len(), "repository index refreshed");
        self.index.replace(index)
    }

    async fn fetch_artifact(
        &self,
        id: &str,
        version_code: u64,
        file: &ArtifactFile,
        on_chunk: ChunkSink<'_>,
    ) -> Result<Vec<u8>, InstallError> {
        let rel = super::artifact_path(id, version_code, &file.name)?;
        let url = self.url(&rel);
        let resp = self.get(&rel).await?;
        let mut stream = resp.bytes_stream();
        let mut buf = Vec::with_capacity(usize::try_from(file.size).unwrap_or(0));
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| map_reqwest_error(&e, &url))?;
            if buf.len().saturating_add(chunk.len()) as u64 > file.size {
                return Err(InstallError::VerificationFailure(format!(
                    "{} is larger than the declared {} bytes",
                    file.name, file.size
                )));
            }
            buf.extend_from_slice(&chunk);
            on_chunk(chunk.len());
        }
        Ok(buf)
    }
}

/// What: Fold a transport error into the install taxonomy.
///
/// Inputs:
/// - `e`: Error returned by `reqwest`
/// - `url`: Requested URL, used in the message
///
/// Output:
/// - `HostUnresolvable` for DNS failures, `DecodeFailure` for body decoding,
///   status-derived kinds when the error carries a status, otherwise
///   `NetworkUnreachable`.
fn map_reqwest_error(e: &reqwest::Error, url: &str) -> InstallError {
    if let Some(status) = e.status() {
        return map_status(status, url);
    }
    if e.is_decode() {
        return InstallError::DecodeFailure(e.to_string());
    }
    if e.is_connect() && is_dns_failure(e) {
        let host = reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| url.to_string());
        return InstallError::HostUnresolvable(host);
    }
    InstallError::NetworkUnreachable(e.to_string())
}

/// Phrases name-resolution failures carry in their messages: hyper-util's
/// connector prefixes them with "dns error", the system resolver reports
/// "failed to lookup address information".
const DNS_ERROR_MARKERS: [&str; 2] = ["dns error", "failed to lookup address"];

/// What: Guess whether a connect failure came from name resolution.
///
/// Inputs:
/// - `e`: Top of the error chain (`reqwest::Error` in practice)
///
/// Output:
/// - `true` when any error in the chain carries a resolver message.
///
/// Details:
/// - Heuristic. Neither `reqwest` nor `std::io::ErrorKind` expose a stable
///   resolver kind, so the chain's messages are matched against
///   [`DNS_ERROR_MARKERS`]. A miss falls back to `NetworkUnreachable`.
fn is_dns_failure(e: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(e);
    while let Some(err) = current {
        let text = err.to_string().to_lowercase();
        if DNS_ERROR_MARKERS.iter().any(|m| text.contains(m)) {
            return true;
        }
        current = err.source();
    }
    false
}

/// Map an HTTP error status onto the taxonomy.
fn map_status(status: reqwest::StatusCode, url: &str) -> InstallError {
    match status {
        reqwest::StatusCode::NOT_FOUND | reqwest::StatusCode::GONE => {
            InstallError::ArtifactNotFound(url.to_string())
        }
        reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS => {
            InstallError::PolicyRestricted(format!("HTTP {status} for {url}"))
        }
        _ => InstallError::NetworkUnreachable(format!("HTTP {status} for {url}")),
    }
}
