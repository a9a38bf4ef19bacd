//! Integrity and structure checks run before anything reaches the host installer.

use sha2::{Digest, Sha256};

use super::error::InstallError;
use crate::state::ArtifactFile;

/// Local file header signature that starts every ZIP-based package.
const ZIP_LOCAL_HEADER: [u8; 4] = *b"PK\x03\x04";

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// What: Check a downloaded file against its declared size and digest.
///
/// Inputs:
/// - `file`: Declared metadata from the repository
/// - `bytes`: Downloaded contents
///
/// Output:
/// - `Ok(())` when both match.
///
/// # Errors
/// - `VerificationFailure` on a size or digest mismatch.
pub fn verify_integrity(file: &ArtifactFile, bytes: &[u8]) -> Result<(), InstallError> {
    if bytes.len() as u64 != file.size {
        return Err(InstallError::VerificationFailure(format!(
            "{}: expected {} bytes, got {}",
            file.name,
            file.size,
            bytes.len()
        )));
    }
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(file.sha256.trim()) {
        return Err(InstallError::VerificationFailure(format!(
            "{}: checksum mismatch (expected {}, got {actual})",
            file.name, file.sha256
        )));
    }
    Ok(())
}

/// What: Structural check that a file is a ZIP-based package.
///
/// # Errors
/// - `MalformedPackage` when the ZIP local header is missing.
pub fn verify_structure(name: &str, bytes: &[u8]) -> Result<(), InstallError> {
    if bytes.starts_with(&ZIP_LOCAL_HEADER) {
        Ok(())
    } else {
        Err(InstallError::MalformedPackage(format!(
            "{name} is not a package archive"
        )))
    }
}
