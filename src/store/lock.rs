//! Advisory file locking discipline (spec.md §5): journal appends take a
//! shared lock, whole-file rewrites take an exclusive lock for the duration
//! of the read-modify-write.

use crate::error::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

pub struct ExclusiveLock {
    _file: File,
}

impl ExclusiveLock {
    /// Blocks until the exclusive lock on `path` is acquired. The lock is
    /// released when the guard drops.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()
            .map_err(|e| crate::error::Error::Fatal(format!("lock {path:?}: {e}")))?;
        Ok(Self { _file: file })
    }
}

pub struct SharedLock {
    _file: File,
}

impl SharedLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        file.lock_shared()
            .map_err(|e| crate::error::Error::Fatal(format!("lock {path:?}: {e}")))?;
        Ok(Self { _file: file })
    }
}
