//! Command-line argument parsing and handling.

pub mod definition;
pub mod install;
pub mod launch;
pub mod list;
pub mod refresh;
pub mod remove;
pub mod utils;
pub mod watch;

// Re-export commonly used items
pub use definition::{Args, process_args};
pub use utils::determine_log_level;
