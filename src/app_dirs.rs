//! Locations of the `.specgram` settings and log folders.
//!
//! Everything lives under the OS config directory unless
//! `SPECGRAM_CONFIG_HOME` points somewhere else, which tests and portable
//! installs use.

use std::path::PathBuf;
use std::sync::{LazyLock, Mutex};

use directories::BaseDirs;
use thiserror::Error;

/// Directory created under the config root.
pub const APP_DIR_NAME: &str = ".specgram";
/// Environment variable replacing the OS config root.
pub const CONFIG_HOME_ENV: &str = "SPECGRAM_CONFIG_HOME";

static BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

/// Errors resolving or creating application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    /// Neither the override nor the OS provided a config root.
    #[error("No config directory available for specgram files")]
    NoBaseDir,
    /// A directory could not be created.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.specgram` root, created on demand.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// `logs/` under the root, created on demand.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("logs"))
}

/// Create `path` and its parents, returning it.
pub fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn config_base_dir() -> Option<PathBuf> {
    let overridden = BASE_OVERRIDE.lock().ok().and_then(|guard| guard.clone());
    overridden
        .or_else(|| std::env::var_os(CONFIG_HOME_ENV).map(PathBuf::from))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}
