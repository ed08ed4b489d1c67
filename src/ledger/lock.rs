//! Exclusive lock file guarding the store's read-modify-write cycle.
//!
//! The lock is a sibling file created with `create_new`, so any process
//! sharing the filesystem can take part without shared memory. Waits are
//! bounded. Critical sections are short, so a lock older than the stale
//! threshold is treated as left behind by a crashed holder and broken.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::WallClock;
use crate::error::Transience;

/// How long to wait for the lock and when to consider it abandoned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockPolicy {
    pub timeout: Duration,
    pub retry_interval: Duration,
    pub stale_after: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2_000),
            retry_interval: Duration::from_millis(10),
            stale_after: Duration::from_millis(10_000),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockMeta {
    pub pid: u32,
    pub acquired_at_ms: u64,
    pub ledger_version: String,
}

impl LockMeta {
    fn new(acquired_at: WallClock) -> Self {
        Self {
            pid: std::process::id(),
            acquired_at_ms: acquired_at.0,
            ledger_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Held lock; released on drop.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
    meta: LockMeta,
    released: bool,
}

impl StoreLock {
    /// Lock path for a store file: `<store>.lock`.
    pub fn path_for(store_path: &Path) -> PathBuf {
        let mut name = store_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        store_path.with_file_name(name)
    }

    pub fn acquire(store_path: &Path, policy: LockPolicy) -> Result<Self, LockError> {
        let path = Self::path_for(store_path);
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        reject_symlink(&path)?;

        let started = Instant::now();
        loop {
            let now = WallClock::now();
            match open_new_lock_file(&path) {
                Ok(mut file) => {
                    let meta = LockMeta::new(now);
                    if let Err(err) = write_metadata(&mut file, &path, &meta) {
                        let _ = fs::remove_file(&path);
                        return Err(err);
                    }
                    return Ok(Self {
                        path,
                        meta,
                        released: false,
                    });
                }
                Err(LockError::Io(err)) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(err),
            }

            if break_if_stale(&path, policy.stale_after, now)? {
                continue;
            }

            let waited = started.elapsed();
            if waited >= policy.timeout {
                return Err(LockError::Timeout {
                    path: Box::new(path.clone()),
                    waited_ms: waited.as_millis() as u64,
                    holder: read_metadata(&path).ok().map(Box::new),
                });
            }
            thread::sleep(policy.retry_interval.min(policy.timeout - waited));
        }
    }

    pub fn meta(&self) -> &LockMeta {
        &self.meta
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) -> Result<(), LockError> {
        if !self.released {
            self.released = true;
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("store lock at {path:?} still held after {waited_ms}ms")]
    Timeout {
        path: Box<PathBuf>,
        waited_ms: u64,
        holder: Option<Box<LockMeta>>,
    },
    #[error("store lock path is a symlink: {path:?}")]
    Symlink { path: PathBuf },
    #[error("lock metadata corrupted at {path:?}: {source}")]
    MetadataCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl LockError {
    pub fn transience(&self) -> Transience {
        match self {
            LockError::Timeout { .. } => Transience::Retryable,
            LockError::Symlink { .. } | LockError::MetadataCorrupt { .. } => {
                Transience::Permanent
            }
            LockError::Io(_) => Transience::Unknown,
        }
    }
}

/// Lock file contents plus mtime, enough to tell one lock from its successor.
#[derive(Debug, PartialEq, Eq)]
struct LockSnapshot {
    bytes: Vec<u8>,
    modified: Option<SystemTime>,
}

impl LockSnapshot {
    fn read(path: &Path) -> Result<Self, LockError> {
        reject_symlink(path)?;
        let bytes = fs::read(path)?;
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
        Ok(Self { bytes, modified })
    }

    /// Acquisition time from the metadata, or the mtime when the metadata
    /// is half-written.
    fn acquired_at(&self) -> WallClock {
        if let Ok(meta) = serde_json::from_slice::<LockMeta>(&self.bytes) {
            return WallClock(meta.acquired_at_ms);
        }
        let ms = self
            .modified
            .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
            .unwrap_or_default()
            .as_millis() as u64;
        WallClock(ms)
    }
}

static BREAK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Remove the lock if it outlived `stale_after`. Returns true when gone.
fn break_if_stale(path: &Path, stale_after: Duration, now: WallClock) -> Result<bool, LockError> {
    let seen = match LockSnapshot::read(path) {
        Ok(seen) => seen,
        Err(LockError::Io(err)) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(err),
    };
    let age = Duration::from_millis(now.0.saturating_sub(seen.acquired_at().0));
    if age <= stale_after {
        return Ok(false);
    }
    let broken = take_if_unchanged(path, &seen)?;
    if broken {
        tracing::warn!(path = ?path, age_ms = age.as_millis() as u64, "broke stale store lock");
    }
    Ok(broken)
}

/// Move the lock aside and delete it, but only if it is still the one in
/// `seen`. Rename is atomic, so at most one waiter takes a given file.
fn take_if_unchanged(path: &Path, seen: &LockSnapshot) -> Result<bool, LockError> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(
        ".stale-{}-{}",
        std::process::id(),
        BREAK_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let aside = path.with_file_name(name);

    match fs::rename(path, &aside) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(err) => return Err(LockError::Io(err)),
    }

    let unchanged = matches!(LockSnapshot::read(&aside), Ok(taken) if taken == *seen);
    if !unchanged {
        // A live lock replaced the stale one before the rename: put it back.
        if let Err(err) = fs::hard_link(&aside, path) {
            tracing::warn!(path = ?path, error = %err, "could not restore store lock taken by mistake");
        }
    }
    if let Err(err) = fs::remove_file(&aside) {
        tracing::warn!(path = ?aside, error = %err, "failed to remove broken store lock");
    }
    Ok(unchanged)
}

fn reject_symlink(path: &Path) -> Result<(), LockError> {
    if let Ok(meta) = fs::symlink_metadata(path) {
        if meta.file_type().is_symlink() {
            return Err(LockError::Symlink {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn read_metadata(path: &Path) -> Result<LockMeta, LockError> {
    reject_symlink(path)?;
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|source| LockError::MetadataCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_metadata(file: &mut fs::File, path: &Path, meta: &LockMeta) -> Result<(), LockError> {
    serde_json::to_writer(&mut *file, meta).map_err(|source| LockError::MetadataCorrupt {
        path: path.to_path_buf(),
        source,
    })?;
    file.sync_all()?;
    Ok(())
}

fn open_new_lock_file(path: &Path) -> Result<fs::File, LockError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true).mode(0o600);
        Ok(options.open(path)?)
    }
    #[cfg(not(unix))]
    {
        Ok(fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_policy() -> LockPolicy {
        LockPolicy {
            timeout: Duration::from_millis(50),
            retry_interval: Duration::from_millis(5),
            stale_after: Duration::from_secs(60),
        }
    }

    #[test]
    fn lock_path_is_sibling() {
        let path = StoreLock::path_for(Path::new("/tmp/data/wishes_data.json"));
        assert_eq!(path, PathBuf::from("/tmp/data/wishes_data.json.lock"));
    }

    #[test]
    fn second_acquire_times_out_then_succeeds_after_release() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = dir.path().join("wishes_data.json");

        let held = StoreLock::acquire(&store, quick_policy()).expect("first acquire");
        assert_eq!(held.meta().pid, std::process::id());

        let err = StoreLock::acquire(&store, quick_policy()).expect_err("contended");
        assert!(err.transience().is_retryable());
        match err {
            LockError::Timeout { holder, .. } => {
                assert_eq!(holder.expect("holder meta").pid, std::process::id());
            }
            other => panic!("unexpected error: {other:?}"),
        }

        held.release().expect("release");
        let again = StoreLock::acquire(&store, quick_policy()).expect("reacquire");
        drop(again);
        assert!(!StoreLock::path_for(&store).exists());
    }

    #[test]
    fn stale_lock_is_broken() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = dir.path().join("wishes_data.json");
        let lock_path = StoreLock::path_for(&store);
        let stale = LockMeta {
            pid: 1,
            acquired_at_ms: WallClock::now().0 - 120_000,
            ledger_version: "0.0.0".into(),
        };
        fs::write(&lock_path, serde_json::to_vec(&stale).unwrap()).unwrap();

        let lock = StoreLock::acquire(&store, quick_policy()).expect("stale lock broken");
        assert_eq!(lock.meta().pid, std::process::id());
    }

    #[test]
    fn fresh_garbage_lock_is_respected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = dir.path().join("wishes_data.json");
        fs::write(StoreLock::path_for(&store), b"{half").unwrap();

        let err = StoreLock::acquire(&store, quick_policy()).expect_err("held");
        assert!(matches!(err, LockError::Timeout { holder: None, .. }));
    }

    #[test]
    fn stale_break_spares_a_lock_that_replaced_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lock_path = StoreLock::path_for(&dir.path().join("wishes_data.json"));
        let stale = LockMeta {
            pid: 1,
            acquired_at_ms: 1_000,
            ledger_version: "0.0.0".into(),
        };
        fs::write(&lock_path, serde_json::to_vec(&stale).unwrap()).unwrap();
        let seen = LockSnapshot::read(&lock_path).expect("snapshot");

        // Another waiter breaks the stale lock and takes a fresh one.
        let fresh = LockMeta::new(WallClock::now());
        fs::remove_file(&lock_path).unwrap();
        fs::write(&lock_path, serde_json::to_vec(&fresh).unwrap()).unwrap();

        assert!(!take_if_unchanged(&lock_path, &seen).expect("take"));
        let kept: LockMeta = serde_json::from_slice(&fs::read(&lock_path).unwrap()).unwrap();
        assert_eq!(kept, fresh);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "no leftovers");
    }

    #[test]
    fn stale_break_removes_the_lock_it_judged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lock_path = StoreLock::path_for(&dir.path().join("wishes_data.json"));
        fs::write(&lock_path, b"{half").unwrap();
        let seen = LockSnapshot::read(&lock_path).expect("snapshot");

        assert!(take_if_unchanged(&lock_path, &seen).expect("take"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(take_if_unchanged(&lock_path, &seen).expect("already gone"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_lock_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = dir.path().join("wishes_data.json");
        let target = dir.path().join("elsewhere");
        fs::write(&target, b"").unwrap();
        std::os::unix::fs::symlink(&target, StoreLock::path_for(&store)).unwrap();

        let err = StoreLock::acquire(&store, quick_policy()).expect_err("symlink");
        assert!(matches!(err, LockError::Symlink { .. }));
    }
}
