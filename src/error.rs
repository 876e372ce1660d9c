//! Error types for kvfiles
//!
//! Provides a unified error type for all operations.

use std::time::Duration;

use thiserror::Error;

use crate::key::KeyError;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for kvfiles operations
///
/// A missing key is not an error: `Storage::get` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    /// Key failed path-safety validation. No I/O was performed.
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: KeyError },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Caller-side Errors
    // -------------------------------------------------------------------------
    #[error("Operation timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

impl KvError {
    /// Build an `InvalidKey` error, rendering the raw key lossily for display
    pub(crate) fn invalid_key(key: &[u8], reason: KeyError) -> Self {
        KvError::InvalidKey {
            key: String::from_utf8_lossy(key).into_owned(),
            reason,
        }
    }

    /// True if this error came from key validation
    pub fn is_invalid_key(&self) -> bool {
        matches!(self, KvError::InvalidKey { .. })
    }
}
