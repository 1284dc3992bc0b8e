//! Exclusive run lock.
//!
//! Two runs against the same cache directory would race on cache entries and
//! the output workbook. The lock file is created with `create_new` so only one
//! process can hold it; it is removed when the guard drops.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const LOCK_FILE: &str = ".rate-ledger.lock";

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Take the lock inside `dir`, creating the directory if needed.
    pub fn acquire(dir: &Path) -> Result<Self, AppError> {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::cache(format!("failed to create '{}': {e}", dir.display())))?;

        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => AppError::config(format!(
                    "another run holds '{}'; remove it if no run is active",
                    path.display()
                )),
                _ => AppError::cache(format!("failed to create '{}': {e}", path.display())),
            })?;

        // Owner pid, for whoever finds a stale lock.
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            tracing::warn!(path = %path.display(), error = %e, "failed to record owner pid in run lock");
        }
        tracing::debug!(path = %path.display(), "run lock acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release run lock");
        }
    }
}
