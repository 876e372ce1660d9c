//! Configuration for kvfiles
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Main configuration for a kvfiles store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Base directory holding one file per key
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── <key>                (one regular file per key)
    ///     └── .kvfiles-tmp*        (in-flight writes, swept at open)
    pub data_dir: PathBuf,

    /// How hard `set` pushes bytes to stable storage before publishing
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Concurrency Configuration
    // -------------------------------------------------------------------------
    /// Number of cache shards (and per-shard write locks)
    pub shard_count: usize,
}

/// Durability level for the write path
///
/// Every strategy writes through a temp file and an atomic rename, so readers
/// never see a partial file. The strategies differ in what survives power loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Rename only, leave flushing to the OS
    None,

    /// fsync the temp file before the rename
    File,

    /// fsync the temp file, then fsync the directory after the rename (Unix)
    FileAndDirectory,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./kvdata"),
            sync_strategy: SyncStrategy::File,
            shard_count: 64,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config before a store is opened with it
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(KvError::Config("shard_count must be at least 1".to_string()));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(KvError::Config("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the base directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the number of shards
    pub fn shard_count(mut self, count: usize) -> Self {
        self.config.shard_count = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
