//! Settings file handling: paths, parsing, skeleton and in-place saves.

pub mod paths;
mod save;
mod settings;
mod skeleton;

pub use paths::{config_dir, default_device_root, index_cache_path, logs_dir, settings_path};
pub use save::{save_boolean_key, save_string_key};
pub use settings::{Settings, load_settings, parse_settings};
pub use skeleton::SETTINGS_SKELETON_CONTENT;
