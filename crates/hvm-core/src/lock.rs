//! Exclusive lock around mutating commands
//!
//! Two invocations that both rewrite the schema or a values document must
//! not interleave their read-modify-write cycles. Each such command holds a
//! [`FileLock`] on a side-car file for its whole duration.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default name of the side-car lock file
pub const LOCK_FILE: &str = ".hvm.lock";

/// Held exclusive lock; released on drop
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the lock on `path` is acquired, creating the file if needed
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock()?;
        tracing::debug!(path = %path.display(), "acquired lock");

        Ok(Self { file, path })
    }

    /// Try to take the lock without blocking; `None` if another holder has it
    pub fn try_acquire<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        match file.try_lock() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(std::fs::TryLockError::WouldBlock) => Ok(None),
            Err(std::fs::TryLockError::Error(err)) => Err(err.into()),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), "failed to release lock: {}", err);
        } else {
            tracing::debug!(path = %self.path.display(), "released lock");
        }
    }
}
