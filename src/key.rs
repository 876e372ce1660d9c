//! Key validation and file naming
//!
//! Turns caller-supplied key bytes into a [`SafeKey`]: a validated key plus
//! the single file name it is stored under. The disk layer only accepts
//! `SafeKey`, so raw caller bytes never reach a path join.
//!
//! ## Rules
//! - non-empty, at most [`MAX_KEY_LEN`] bytes
//! - valid UTF-8, no NUL
//! - no `/` or `\` anywhere, no `:` (Windows drive marker)
//! - must not start with `.` (covers `.`, `..` and the temp-file prefix)
//!
//! ## File Names
//! The file name must stay distinct on filesystems that fold case (APFS,
//! NTFS), normalize Unicode, strip trailing dots, or reserve device names.
//! Each key byte maps to:
//!
//! ```text
//!   a-z 0-9 _ -     itself
//!   .               itself, except as the last byte
//!   A-Z             ^ + lowercase letter      ("A.txt" -> "^a.txt")
//!   anything else   %xx, lowercase hex        ("a b"   -> "a%20b")
//! ```
//!
//! A Windows device stem (`con`, `nul`, `com1`, ...) gets its first byte
//! escaped. `^` and `%` only appear as escapes, so the encoding is
//! injective, and its output is plain ASCII with no uppercase letters.

use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::{KvError, Result};

/// Longest key, and longest encoded file name, accepted (NAME_MAX)
pub const MAX_KEY_LEN: usize = 255;

/// Stems Windows treats as devices regardless of extension
const RESERVED_STEMS: [&str; 4] = ["con", "prn", "aux", "nul"];

/// Why a key was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key is empty")]
    Empty,

    #[error("key (or its file name) is {len} bytes, limit is {}", MAX_KEY_LEN)]
    TooLong { len: usize },

    #[error("key contains a NUL byte")]
    NulByte,

    #[error("key is not valid UTF-8")]
    NotUtf8,

    #[error("key is an absolute path")]
    AbsolutePath,

    #[error("key contains a path separator")]
    Separator,

    #[error("key contains a drive marker")]
    DriveMarker,

    #[error("key is a `.` or `..` segment")]
    DotSegment,

    #[error("key starts with a reserved `.`")]
    LeadingDot,
}

/// A validated key and the file name it maps to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeKey {
    name: String,
    file_name: String,
}

impl SafeKey {
    /// Validate raw key bytes
    pub fn parse(key: &[u8]) -> Result<Self> {
        check(key)
            .and_then(|name| {
                let file_name = encode_file_name(name);
                if file_name.len() > MAX_KEY_LEN {
                    return Err(KeyError::TooLong { len: file_name.len() });
                }
                Ok(Self {
                    name: name.to_owned(),
                    file_name,
                })
            })
            .map_err(|reason| KvError::invalid_key(key, reason))
    }

    /// The key as the caller wrote it
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The file name this key is stored under
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full path of the backing file under `base_dir`
    pub fn path_in(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.file_name)
    }
}

impl fmt::Display for SafeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Resolve a raw key to its backing file path, or reject it
pub fn path_for(base_dir: &Path, key: &[u8]) -> Result<PathBuf> {
    Ok(SafeKey::parse(key)?.path_in(base_dir))
}

fn check(key: &[u8]) -> std::result::Result<&str, KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.len() > MAX_KEY_LEN {
        return Err(KeyError::TooLong { len: key.len() });
    }
    if key.contains(&0) {
        return Err(KeyError::NulByte);
    }

    let name = std::str::from_utf8(key).map_err(|_| KeyError::NotUtf8)?;

    if name.starts_with(['/', '\\']) {
        return Err(KeyError::AbsolutePath);
    }
    if name.contains(['/', '\\']) {
        return Err(KeyError::Separator);
    }
    if name.contains(':') {
        return Err(KeyError::DriveMarker);
    }
    if name == "." || name == ".." {
        return Err(KeyError::DotSegment);
    }
    if name.starts_with('.') {
        return Err(KeyError::LeadingDot);
    }

    Ok(name)
}

fn encode_file_name(name: &str) -> String {
    let bytes = name.as_bytes();
    let mut out = String::with_capacity(bytes.len());

    for (i, &b) in bytes.iter().enumerate() {
        let last = i + 1 == bytes.len();
        match b {
            b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => out.push(b as char),
            b'.' if !last => out.push('.'),
            b'A'..=b'Z' => {
                out.push('^');
                out.push(b.to_ascii_lowercase() as char);
            }
            _ => {
                let _ = write!(out, "%{:02x}", b);
            }
        }
    }

    if is_reserved_stem(&out) {
        let first = out.remove(0);
        out.insert_str(0, &format!("%{:02x}", first as u8));
    }

    out
}

/// `con`, `con.txt`, `com1.log`, ... (the encoded name is already lowercase)
fn is_reserved_stem(file_name: &str) -> bool {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    if RESERVED_STEMS.contains(&stem) {
        return true;
    }
    matches!(stem.as_bytes(), [b'c', b'o', b'm', d] | [b'l', b'p', b't', d] if d.is_ascii_digit())
}
