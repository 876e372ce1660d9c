//! Integration tests for kvfiles

use std::sync::Arc;
use std::time::Duration;

use kvfiles::stress::{self, StressConfig};
use kvfiles::{call_with_timeout, Config, KvError, Storage, SyncStrategy};
use tempfile::TempDir;

// =============================================================================
// Store + Timeout Wrapper Tests
// =============================================================================

#[test]
fn test_store_call_within_timeout() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(Storage::open_path(temp_dir.path()).unwrap());
    store.set(b"key", b"value").unwrap();

    let reader = Arc::clone(&store);
    let result = call_with_timeout(Duration::from_secs(10), move || reader.get(b"key"))
        .unwrap()
        .unwrap();

    assert_eq!(result, Some(b"value".to_vec()));
}

#[test]
fn test_timeout_leaves_store_usable() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(Storage::open_path(temp_dir.path()).unwrap());

    let writer = Arc::clone(&store);
    let err = call_with_timeout(Duration::from_millis(10), move || {
        std::thread::sleep(Duration::from_millis(200));
        writer.set(b"late", b"eventually")
    })
    .unwrap_err();
    assert!(matches!(err, KvError::Timeout { .. }));

    // The abandoned call still completes in the background.
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(store.get(b"late").unwrap(), Some(b"eventually".to_vec()));
}

// =============================================================================
// Stress Harness Tests
// =============================================================================

#[test]
fn test_stress_run_converges() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::None)
        .shard_count(8)
        .build();
    let store = Storage::open(config).unwrap();

    let workload = StressConfig {
        keys: 8,
        writers: 4,
        readers: 8,
        ops_per_worker: 300,
    };
    let report = stress::run(&store, &workload).unwrap();

    assert!(report.is_clean(), "report: {:?}", report);
    assert_eq!(report.write_ops, 1200);
    assert_eq!(report.read_ops, 2400);
    assert_eq!(report.cached_keys, 8);
}

#[test]
fn test_stress_run_with_single_shard() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(SyncStrategy::None)
        .shard_count(1)
        .build();
    let store = Storage::open(config).unwrap();

    let report = stress::run(
        &store,
        &StressConfig {
            keys: 2,
            writers: 4,
            readers: 4,
            ops_per_worker: 200,
        },
    )
    .unwrap();

    assert!(report.is_clean(), "report: {:?}", report);
}
