//! Sharded cache table
//!
//! HashMap shards with RwLock for concurrency, plus one I/O mutex per shard.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::key::SafeKey;

/// One slice of the key space
///
/// ## Locking
/// - `entries`: many readers or one writer, held only for map operations
/// - `io_lock`: held across a key's disk I/O and the matching map update, so
///   a write and a cache fill on the same shard never interleave
pub struct Shard {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    io_lock: Mutex<()>,
}

impl Shard {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            io_lock: Mutex::new(()),
        }
    }

    /// Copy out the cached value (read lock)
    pub fn get(&self, key: &SafeKey) -> Option<Vec<u8>> {
        self.entries.read().get(key.as_str()).cloned()
    }

    /// Replace the cached value (write lock)
    pub fn insert(&self, key: &SafeKey, value: Vec<u8>) {
        self.entries.write().insert(key.as_str().to_owned(), value);
    }

    /// Serialize disk I/O for keys in this shard
    pub fn lock_io(&self) -> MutexGuard<'_, ()> {
        self.io_lock.lock()
    }

    /// Number of keys cached in this shard
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Fixed set of shards addressed by key hash
pub struct CacheTable {
    shards: Box<[Shard]>,
}

impl CacheTable {
    /// Create a table with `shard_count` shards (at least one)
    pub fn new(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Shard::new()).collect();
        Self { shards }
    }

    /// The shard that owns `key`
    pub fn shard(&self, key: &SafeKey) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    /// Index of the shard that owns `key`
    pub fn shard_index(&self, key: &SafeKey) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Total cached keys across all shards
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }
}
