#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use wish_ledger::ledger::{Ledger, LockPolicy};
use wish_ledger::paths::{DataDirOverride, override_data_dir_for_tests, store_path};

/// Scratch data dir; `wish_ledger::paths` resolves into it on this thread.
pub struct TempStoreDir {
    _temp: TempDir,
    data_dir: PathBuf,
    _override: DataDirOverride,
}

impl TempStoreDir {
    pub fn new() -> std::io::Result<Self> {
        let temp = TempDir::new()?;
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&data_dir)?;
        let override_guard = override_data_dir_for_tests(Some(data_dir.clone()));

        Ok(Self {
            _temp: temp,
            data_dir,
            _override: override_guard,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store_path(&self) -> PathBuf {
        store_path()
    }

    /// Fresh handle on the shared store file, as a separate session would open it.
    pub fn ledger(&self) -> Ledger {
        Ledger::with_policy(self.store_path(), patient_policy())
    }

    pub fn write_store(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.store_path();
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_store(&self) -> std::io::Result<serde_json::Value> {
        let raw = std::fs::read_to_string(self.store_path())?;
        serde_json::from_str(&raw).map_err(std::io::Error::other)
    }
}

/// Long enough that contention never falls back to unlocked writes.
pub fn patient_policy() -> LockPolicy {
    LockPolicy {
        timeout: Duration::from_secs(30),
        retry_interval: Duration::from_millis(2),
        stale_after: Duration::from_secs(120),
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
