//! Staged write
//!
//! A value written to a temp file in the target directory, waiting to be
//! renamed over the key's backing file.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::SyncStrategy;
use crate::error::Result;

use super::TEMP_PREFIX;

/// Fully written temp file. Dropping it without [`commit`](Self::commit)
/// deletes the temp file and leaves the target untouched.
pub struct StagedWrite {
    temp: NamedTempFile,
}

impl StagedWrite {
    /// Write `value` to a fresh temp file in `dir`
    pub(crate) fn create(dir: &Path, value: &[u8], sync: SyncStrategy) -> Result<Self> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)?;

        temp.write_all(value)?;
        temp.flush()?;

        if sync != SyncStrategy::None {
            temp.as_file().sync_all()?;
        }

        Ok(Self { temp })
    }

    #[cfg(test)]
    pub(crate) fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Atomically rename the temp file over `target`
    ///
    /// Once this returns `Ok` the new value is what every reader of `target`
    /// sees. On failure the temp file is removed and `target` keeps its old
    /// content. The directory entry is not fsynced here; see
    /// [`KeyFiles::sync_dir`](super::KeyFiles::sync_dir).
    pub fn commit(self, target: &Path) -> Result<()> {
        self.temp.persist(target).map_err(|e| e.error)?;
        Ok(())
    }

    /// Leave the temp file on disk without renaming it, as a crash between
    /// the write and the rename would
    #[cfg(test)]
    pub(crate) fn interrupt(self) -> std::path::PathBuf {
        self.temp
            .into_temp_path()
            .keep()
            .expect("failed to keep temp file")
    }
}
