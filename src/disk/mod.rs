//! Disk Module
//!
//! One regular file per key, directly under the base directory.
//!
//! ## Responsibilities
//! - Read a key's backing file, mapping "no such file" to absent
//! - Replace a key's backing file atomically
//! - Remove temp files left behind by interrupted writes
//!
//! ## Write Protocol
//! ```text
//!   value ──► {dir}/.kvfiles-tmpXXXXXX   write_all + flush (+ fsync)
//!                       │
//!                       │ rename(2), atomic within one filesystem
//!                       ▼
//!             {dir}/<encoded key>        commit point
//!                       │
//!                       ▼
//!             fsync {dir}                (FileAndDirectory only)
//! ```
//!
//! A reader opening `<key>` sees either the old complete file or the new
//! complete file. A crash before the rename leaves the old file untouched and
//! a stray temp file, which [`KeyFiles::sweep_temp_files`] removes.

mod files;
mod staged;

pub use files::KeyFiles;
pub use staged::StagedWrite;

/// File name prefix of in-flight writes. Keys may not start with `.`, so no
/// key can collide with it.
pub const TEMP_PREFIX: &str = ".kvfiles-tmp";
