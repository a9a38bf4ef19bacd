use std::env;
use std::path::{Path, PathBuf};

/// Directory name used below the XDG/HOME config base.
const APP_DIR: &str = "storekeep";

/// What: Pick the configuration directory from explicit environment values.
///
/// Inputs:
/// - `xdg_config_home`: Value of `XDG_CONFIG_HOME`, if set
/// - `home`: Value of `HOME`, if set
///
/// Output:
/// - `$XDG_CONFIG_HOME/storekeep` when non-empty, else `$HOME/.config/storekeep`,
///   else `./.config/storekeep`.
#[must_use]
pub fn resolve_config_dir(xdg_config_home: Option<&str>, home: Option<&str>) -> PathBuf {
    if let Some(xdg) = xdg_config_home
        && !xdg.trim().is_empty()
    {
        return Path::new(xdg).join(APP_DIR);
    }
    let home = home.filter(|h| !h.trim().is_empty()).unwrap_or(".");
    Path::new(home).join(".config").join(APP_DIR)
}

/// What: Configuration directory, ensured to exist.
///
/// Inputs:
/// - `override_dir`: `--config-dir` value, used verbatim when given
///
/// Output:
/// - The resolved directory (creation failures are left to the first write).
#[must_use]
pub fn config_dir(override_dir: Option<&Path>) -> PathBuf {
    let dir = override_dir.map_or_else(
        || {
            resolve_config_dir(
                env::var("XDG_CONFIG_HOME").ok().as_deref(),
                env::var("HOME").ok().as_deref(),
            )
        },
        Path::to_path_buf,
    );
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// `settings.conf` inside `config_dir`.
#[must_use]
pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.conf")
}

/// Logs directory under config (ensured to exist).
#[must_use]
pub fn logs_dir(config_dir: &Path) -> PathBuf {
    let dir = config_dir.join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Cached trusted app list.
#[must_use]
pub fn index_cache_path(config_dir: &Path) -> PathBuf {
    config_dir.join("repo_index.json")
}

/// Default device root when `device_root` is not configured.
#[must_use]
pub fn default_device_root(config_dir: &Path) -> PathBuf {
    config_dir.join("device")
}
