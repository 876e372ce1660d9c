//! Cache Module
//!
//! In-memory copy of every key that has been read or written.
//!
//! ## Responsibilities
//! - Fast reads without touching disk
//! - Shared-read / exclusive-write access per shard
//! - Per-shard write lock that serializes disk I/O for the keys in that shard
//! - Hit/miss/fill/write counters
//!
//! ## Data Structure Choice
//! A fixed array of shards, each a `HashMap` behind a `parking_lot::RwLock`,
//! selected by hashing the key:
//! - Unrelated keys rarely share a lock
//! - Entries are never evicted, so the shard count never changes
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                      CacheTable                        │
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐               │
//! │  │ Shard 0  │ │ Shard 1  │ │ Shard 2  │  ...  N-1     │
//! │  │ RwLock   │ │ RwLock   │ │ RwLock   │               │
//! │  │ io Mutex │ │ io Mutex │ │ io Mutex │               │
//! │  └──────────┘ └──────────┘ └──────────┘               │
//! └────────────────────────────────────────────────────────┘
//! ```

mod stats;
mod table;

pub use stats::{CacheCounters, StoreStats};
pub use table::CacheTable;
