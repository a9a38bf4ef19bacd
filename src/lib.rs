//! Library entry for storekeep exposing install orchestration for the binary and integration tests.
//!
//! - [`state`]: install status registry and shared data types
//! - [`sources`]: repository access (HTTP and local mirror)
//! - [`install`]: verified downloads, the package host seam and the installer
//! - [`logic`]: per-screen coordination and install affordances
//! - [`jobs`]: background refresh and auto-update
//! - [`config`]: `settings.conf` handling and paths
//! - [`app`]: runtime wiring

pub mod app;
pub mod config;
pub mod install;
pub mod jobs;
pub mod logic;
pub mod sources;
pub mod state;
pub mod util;

#[cfg(test)]
mod test_utils;
