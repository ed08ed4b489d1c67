//! XDG directory helpers for config/data locations.

use std::cell::RefCell;
use std::path::PathBuf;

pub const STORE_FILE_NAME: &str = "wishes_data.json";

/// Base directory for persistent data (the store file, logs).
///
/// Uses `WL_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/wish-ledger` or
/// `~/.local/share/wish-ledger`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = thread_local_data_dir_override() {
        return dir;
    }

    if let Some(dir) = non_blank_env("WL_DATA_DIR") {
        return PathBuf::from(dir);
    }

    non_blank_env("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home().join(".local").join("share"))
        .join("wish-ledger")
}

/// Default store file.
pub fn store_path() -> PathBuf {
    data_dir().join(STORE_FILE_NAME)
}

/// Default directory for rolling log files.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Base directory for configuration files.
///
/// Uses `WL_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/wish-ledger` or
/// `~/.config/wish-ledger`.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = non_blank_env("WL_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    non_blank_env("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home().join(".config"))
        .join("wish-ledger")
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp"))
}

#[doc(hidden)]
pub struct DataDirOverride {
    prev: Option<PathBuf>,
}

impl DataDirOverride {
    pub fn new(path: Option<PathBuf>) -> Self {
        let prev = DATA_DIR_OVERRIDE.with(|cell| cell.replace(path));
        Self { prev }
    }
}

impl Drop for DataDirOverride {
    fn drop(&mut self) {
        let prev = self.prev.take();
        DATA_DIR_OVERRIDE.with(|cell| {
            cell.replace(prev);
        });
    }
}

/// Point `data_dir` at `path` for the current thread until the guard drops.
#[doc(hidden)]
pub fn override_data_dir_for_tests(path: Option<PathBuf>) -> DataDirOverride {
    DataDirOverride::new(path)
}

fn thread_local_data_dir_override() -> Option<PathBuf> {
    DATA_DIR_OVERRIDE.with(|cell| cell.borrow().clone())
}

thread_local! {
    static DATA_DIR_OVERRIDE: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}
