//! Application wiring: settings, repository, host and coordinator.
//!
//! [`Runtime`] owns one of each shared component so the CLI, the background
//! jobs and the integration tests all drive the same objects.

mod init;
mod workers;

pub use init::{AppRow, Runtime, open_repository};
pub use workers::{BACKGROUND_JOBS, spawn_background_jobs};
