//! On-disk cache of raw source responses, one file per fetch window.
//!
//! Entries are written once and never refreshed; delete the file (or the whole
//! directory) to force a re-fetch.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct SourceCache {
    dir: PathBuf,
}

impl SourceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Return the cached bytes for `key`, or call `fetch` and persist its result.
    ///
    /// A failing `fetch` leaves the cache untouched.
    pub fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<Vec<u8>, AppError>
    where
        F: FnOnce() -> Result<Vec<u8>, AppError>,
    {
        let path = self.entry_path(key);
        if path.is_file() {
            tracing::debug!(path = %path.display(), "cache hit");
            return fs::read(&path).map_err(|e| {
                AppError::cache(format!("failed to read cache file '{}': {e}", path.display()))
            });
        }

        tracing::info!(key, dir = %self.dir.display(), "cache miss; fetching");
        let bytes = fetch()?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::cache(format!("failed to create cache dir '{}': {e}", self.dir.display()))
        })?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, &bytes)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| {
                AppError::cache(format!("failed to write cache file '{}': {e}", path.display()))
            })?;

        Ok(bytes)
    }
}
