//! Key safety tests
//!
//! Hostile keys are rejected before any I/O and nothing is written outside
//! the base directory.

use std::fs;
use std::path::Path;

use kvfiles::{KeyError, KvError, Storage};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Base directory nested one level down, so escapes have somewhere to land
fn setup_nested_store() -> (TempDir, Storage) {
    let temp_dir = TempDir::new().unwrap();
    let store = Storage::open_path(temp_dir.path().join("base")).unwrap();
    (temp_dir, store)
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn rejection(result: kvfiles::Result<()>) -> KeyError {
    match result {
        Err(KvError::InvalidKey { reason, .. }) => reason,
        other => panic!("expected InvalidKey, got {:?}", other),
    }
}

// =============================================================================
// Rejection Tests
// =============================================================================

#[test]
fn test_traversal_keys_rejected_without_writes() {
    let (temp, store) = setup_nested_store();

    let hostile: [&[u8]; 9] = [
        b"../escape",
        b"../../etc/passwd",
        b"/tmp/abs",
        b"\\windows\\abs",
        b"dir/file",
        b"..",
        b".",
        b"C:evil",
        b"nul\0byte",
    ];
    for key in hostile {
        let err = store.set(key, b"payload").unwrap_err();
        assert!(err.is_invalid_key(), "{:?} -> {:?}", key, err);
    }

    assert_eq!(entries(temp.path()), vec!["base".to_string()]);
    assert!(entries(&temp.path().join("base")).is_empty());
    assert_eq!(store.cached_len(), 0);
    assert_eq!(store.stats().writes, 0);
}

#[test]
fn test_get_rejects_invalid_keys() {
    let (temp, store) = setup_nested_store();
    fs::write(temp.path().join("outside"), b"secret").unwrap();

    let err = store.get(b"../outside").unwrap_err();
    assert!(err.is_invalid_key());
    assert_eq!(store.stats().misses, 0);
}

#[test]
fn test_rejection_reasons() {
    let (_temp, store) = setup_nested_store();

    assert_eq!(rejection(store.set(b"", b"v")), KeyError::Empty);
    assert_eq!(rejection(store.set(b"../x", b"v")), KeyError::Separator);
    assert_eq!(rejection(store.set(b"/x", b"v")), KeyError::AbsolutePath);
    assert_eq!(rejection(store.set(b"..", b"v")), KeyError::DotSegment);
    assert_eq!(rejection(store.set(b".hidden", b"v")), KeyError::LeadingDot);
    assert_eq!(rejection(store.set(&[0xC3, 0x28], b"v")), KeyError::NotUtf8);
    assert_eq!(
        rejection(store.set(&[b'x'; 256], b"v")),
        KeyError::TooLong { len: 256 }
    );
}

#[test]
fn test_invalid_set_leaves_existing_value() {
    let (_temp, store) = setup_nested_store();
    store.set(b"good", b"kept").unwrap();

    assert!(store.set(b"good/../good", b"replaced").is_err());

    assert_eq!(store.get(b"good").unwrap(), Some(b"kept".to_vec()));
}

// =============================================================================
// Accepted Key Tests
// =============================================================================

#[test]
fn test_dotted_and_unicode_keys_accepted() {
    let (temp, store) = setup_nested_store();

    store.set(b"a.txt", b"1").unwrap();
    store.set(b"archive.tar.gz", b"2").unwrap();
    store.set("ключ".as_bytes(), b"3").unwrap();

    assert_eq!(store.get("ключ".as_bytes()).unwrap(), Some(b"3".to_vec()));
    assert_eq!(
        entries(&temp.path().join("base")),
        vec![
            "%d0%ba%d0%bb%d1%8e%d1%87".to_string(),
            "a.txt".to_string(),
            "archive.tar.gz".to_string(),
        ]
    );
}

#[test]
fn test_case_distinct_keys_get_distinct_files() {
    let (temp, store) = setup_nested_store();

    store.set(b"A.txt", b"upper").unwrap();
    store.set(b"a.txt", b"lower").unwrap();

    let names = entries(&temp.path().join("base"));
    assert_eq!(names, vec!["^a.txt".to_string(), "a.txt".to_string()]);

    // A case-folding filesystem would still see two files
    let folded: std::collections::HashSet<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
    assert_eq!(folded.len(), 2);

    let reopened = Storage::open_path(temp.path().join("base")).unwrap();
    assert_eq!(reopened.get(b"A.txt").unwrap(), Some(b"upper".to_vec()));
    assert_eq!(reopened.get(b"a.txt").unwrap(), Some(b"lower".to_vec()));
}

#[test]
fn test_trailing_dot_and_device_keys_stored_under_encoded_names() {
    let (temp, store) = setup_nested_store();

    store.set(b"trailing..", b"1").unwrap();
    store.set(b"con", b"2").unwrap();
    store.set(b"nul.txt", b"3").unwrap();

    assert_eq!(
        entries(&temp.path().join("base")),
        vec!["%63on".to_string(), "%6eul.txt".to_string(), "trailing.%2e".to_string()]
    );
    assert_eq!(store.get(b"con").unwrap(), Some(b"2".to_vec()));
    store.set(b"CON", b"upper").unwrap();
    assert_eq!(store.get(b"con").unwrap(), Some(b"2".to_vec()));
}
