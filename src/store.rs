//! Store Module
//!
//! The write-through store that coordinates the cache and the key files.
//!
//! ## Responsibilities
//! - Validate keys before any I/O
//! - Serve reads from memory, filling from disk on a miss
//! - Persist writes to disk before publishing them in memory
//! - Keep memory and disk agreeing on the last committed write per key

use std::path::Path;

use crate::cache::{CacheCounters, CacheTable, StoreStats};
use crate::config::Config;
use crate::disk::KeyFiles;
use crate::error::Result;
use crate::key::SafeKey;

/// Write-through key-value store over one file per key
///
/// ## Concurrency Model: per-shard writer, many readers
///
/// - **Reads, cached** (get hit): shard read lock only, no disk I/O
/// - **Reads, uncached** (get miss): shard I/O lock → re-check → read file →
///   insert. The I/O lock keeps a concurrent `set` from landing between the
///   file read and the insert, so a fill never publishes stale bytes.
/// - **Writes** (set): shard I/O lock → temp file + rename → insert. Two
///   writes to one key commit and publish in the same order.
///
/// Keys in different shards never wait on each other.
pub struct Storage {
    /// Store configuration
    config: Config,

    /// Backing files (no internal locking)
    files: KeyFiles,

    /// In-memory entries and per-shard I/O locks
    cache: CacheTable,

    /// Hit/miss/fill/write counters
    counters: CacheCounters,
}

impl Storage {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Create the base directory if it doesn't exist
    /// 3. Sweep temp files left by interrupted writes
    ///
    /// The cache starts empty; existing files are loaded lazily on `get`.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let files = KeyFiles::open(&config.data_dir, config.sync_strategy)?;
        let cache = CacheTable::new(config.shard_count);

        tracing::info!(
            data_dir = %config.data_dir.display(),
            shards = cache.shard_count(),
            sync = ?config.sync_strategy,
            "store opened"
        );

        Ok(Self {
            config,
            files,
            cache,
            counters: CacheCounters::new(),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified base directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::builder().data_dir(path.as_ref()).build())
    }

    /// Get a value by key
    ///
    /// Returns `Ok(None)` when the key has no value. The returned buffer is a
    /// copy the caller owns.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let key = SafeKey::parse(key)?;
        let shard = self.cache.shard(&key);

        // Step 1: Fast path, memory only
        if let Some(value) = shard.get(&key) {
            self.counters.record_hit();
            tracing::trace!(key = %key, "cache hit");
            return Ok(Some(value));
        }
        self.counters.record_miss();

        // Step 2: Exclude writers of this shard for the rest of the fill
        let _io_guard = shard.lock_io();

        // Step 3: Someone may have filled or written it while we waited
        if let Some(value) = shard.get(&key) {
            tracing::trace!(key = %key, "filled by a concurrent caller");
            return Ok(Some(value));
        }

        // Step 4: Load from disk
        let Some(data) = self.files.read(&key)? else {
            tracing::trace!(key = %key, "key absent");
            return Ok(None);
        };

        // Step 5: Publish; no set can have committed since the read
        shard.insert(&key, data.clone());
        self.counters.record_fill();
        tracing::debug!(key = %key, len = data.len(), "cache filled from disk");

        Ok(Some(data))
    }

    /// Set a key's value
    ///
    /// Steps:
    /// 1. Validate key
    /// 2. Acquire the shard's I/O lock
    /// 3. Write temp file, then rename over the backing file
    /// 4. Publish in memory
    /// 5. Fsync the directory (`SyncStrategy::FileAndDirectory` only)
    ///
    /// The rename is the commit point. If step 3 fails nothing changes, on
    /// disk or in memory. If step 5 fails the new value is already visible in
    /// both, and the error reports that its durability is unconfirmed.
    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let key = SafeKey::parse(key)?;
        let shard = self.cache.shard(&key);

        let _io_guard = shard.lock_io();

        self.files.write(&key, value)?;
        shard.insert(&key, value.to_vec());

        self.counters.record_write();
        tracing::debug!(key = %key, len = value.len(), "value written");

        if let Err(e) = self.files.sync_dir() {
            tracing::warn!(key = %key, error = %e, "value committed but directory fsync failed");
            return Err(e);
        }

        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the base directory path
    pub fn data_dir(&self) -> &Path {
        self.files.dir()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of keys currently held in memory
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether `key` is currently held in memory (invalid keys never are)
    pub fn is_cached(&self, key: &[u8]) -> bool {
        SafeKey::parse(key)
            .map(|key| self.cache.shard(&key).get(&key).is_some())
            .unwrap_or(false)
    }

    /// Snapshot of the store's counters
    pub fn stats(&self) -> StoreStats {
        self.counters.snapshot(self.cache.len())
    }
}
