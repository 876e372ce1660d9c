//! # kvfiles
//!
//! A write-through key-value store with:
//! - One file per key under a base directory
//! - An in-memory copy of every key read or written
//! - Atomic temp-file + rename writes (no torn files)
//! - Per-shard locking so unrelated keys don't contend
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Callers (many threads)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ get / set
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Storage                                 │
//! │          (SafeKey validation, shard selection)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ CacheTable  │          │  KeyFiles   │
//!   │ (shards of  │          │ (tmp+rename │
//!   │  RwLock)    │          │  per key)   │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use kvfiles::Storage;
//!
//! let store = Storage::open_path("./kvdata")?;
//! store.set(b"a.txt", b"v1")?;
//! assert_eq!(store.get(b"a.txt")?, Some(b"v1".to_vec()));
//! assert_eq!(store.get(b"missing")?, None);
//! # Ok::<(), kvfiles::KvError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod key;
pub(crate) mod cache;
pub(crate) mod disk;
pub mod store;

pub mod timeout;
pub mod stress;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, SyncStrategy};
pub use key::{KeyError, SafeKey};
pub use cache::StoreStats;
pub use store::Storage;
pub use timeout::call_with_timeout;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvfiles
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
