//! Key files
//!
//! Maps validated keys to backing files and performs the raw file I/O.
//! Holds no locks: callers serialize access per key.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::SyncStrategy;
use crate::error::Result;
use crate::key::SafeKey;

use super::{StagedWrite, TEMP_PREFIX};

/// Backing files for a store
///
/// ## Concurrency:
/// - All methods take `&self`; there is no shared mutable state
/// - Writes to different keys touch different directory entries
pub struct KeyFiles {
    /// Directory holding one file per key
    dir: PathBuf,

    /// Durability level applied by every write
    sync: SyncStrategy,

    /// Make the next `sync_dir` calls fail
    #[cfg(test)]
    fail_dir_sync: AtomicBool,
}

impl KeyFiles {
    /// Open the base directory, creating it if needed
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Remove temp files left by interrupted writes
    pub fn open(dir: &Path, sync: SyncStrategy) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let files = Self {
            dir: dir.to_path_buf(),
            sync,
            #[cfg(test)]
            fail_dir_sync: AtomicBool::new(false),
        };

        let swept = files.sweep_temp_files()?;
        if swept > 0 {
            tracing::warn!(
                dir = %files.dir.display(),
                swept,
                "removed temp files from interrupted writes"
            );
        }

        Ok(files)
    }

    /// Read the whole backing file for `key`
    ///
    /// Returns:
    /// - `Ok(Some(bytes))`: file exists
    /// - `Ok(None)`: no file for this key
    /// - `Err(_)`: any other I/O failure, unchanged
    pub fn read(&self, key: &SafeKey) -> Result<Option<Vec<u8>>> {
        let file = match File::open(self.path_of(key)) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let capacity = file
            .metadata()
            .map(|m| usize::try_from(m.len()).unwrap_or(0))
            .unwrap_or(0);
        let mut data = Vec::with_capacity(capacity);
        BufReader::new(file).read_to_end(&mut data)?;

        Ok(Some(data))
    }

    /// Atomically replace the backing file for `key` with `value`
    ///
    /// `Ok` means the rename happened and readers see `value`. Under
    /// [`SyncStrategy::FileAndDirectory`] the rename is only durable after a
    /// successful [`sync_dir`](Self::sync_dir).
    pub fn write(&self, key: &SafeKey, value: &[u8]) -> Result<()> {
        self.stage(value)?.commit(&self.path_of(key))
    }

    /// Fsync the base directory so committed renames survive a crash
    ///
    /// A no-op unless the strategy is [`SyncStrategy::FileAndDirectory`].
    pub fn sync_dir(&self) -> Result<()> {
        if self.sync != SyncStrategy::FileAndDirectory {
            return Ok(());
        }

        #[cfg(test)]
        if self.fail_dir_sync.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "injected directory fsync failure").into());
        }

        sync_dir(&self.dir)
    }

    #[cfg(test)]
    pub(crate) fn set_fail_dir_sync(&self, fail: bool) {
        self.fail_dir_sync.store(fail, Ordering::SeqCst);
    }

    /// First half of [`write`](Self::write): the value on disk, not yet visible
    pub fn stage(&self, value: &[u8]) -> Result<StagedWrite> {
        StagedWrite::create(&self.dir, value, self.sync)
    }

    /// Delete leftover temp files, returning how many were removed
    pub fn sweep_temp_files(&self) -> Result<usize> {
        let mut removed = 0;

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let is_temp = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(TEMP_PREFIX));

            if is_temp && entry.file_type()?.is_file() {
                tracing::debug!(path = %entry.path().display(), "removing stale temp file");
                match fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    // Another opener got there first.
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        Ok(removed)
    }

    /// Path of the backing file for `key`
    pub fn path_of(&self, key: &SafeKey) -> PathBuf {
        key.path_in(&self.dir)
    }

    /// The base directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

// Directories cannot be opened for fsync on other platforms.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
