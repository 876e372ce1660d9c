//! Benchmarks for kvfiles storage operations

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use kvfiles::{Config, Storage, SyncStrategy};
use tempfile::TempDir;

fn setup_store(sync: SyncStrategy) -> (TempDir, Storage) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path())
        .sync_strategy(sync)
        .build();
    let store = Storage::open(config).unwrap();
    (temp_dir, store)
}

fn storage_benchmarks(c: &mut Criterion) {
    // Cached read: memory only
    c.bench_function("get_hit", |b| {
        let (_temp, store) = setup_store(SyncStrategy::None);
        store.set(b"hot", &[7u8; 256]).unwrap();
        b.iter(|| store.get(b"hot").unwrap());
    });

    // Uncached read: fresh store each batch so the file is read from disk
    c.bench_function("get_miss_fill", |b| {
        b.iter_batched(
            || {
                let temp = TempDir::new().unwrap();
                std::fs::write(temp.path().join("cold"), [3u8; 256]).unwrap();
                let store = Storage::open_path(temp.path()).unwrap();
                (temp, store)
            },
            |(_temp, store)| store.get(b"cold").unwrap(),
            BatchSize::PerIteration,
        );
    });

    // Rename-only write
    c.bench_function("set_no_sync", |b| {
        let (_temp, store) = setup_store(SyncStrategy::None);
        let value = [1u8; 256];
        b.iter(|| store.set(b"key", &value).unwrap());
    });

    // fsync'd write
    c.bench_function("set_fsync", |b| {
        let (_temp, store) = setup_store(SyncStrategy::File);
        let value = [1u8; 256];
        b.iter(|| store.set(b"key", &value).unwrap());
    });

    // Mixed workload: one writer thread, reads on the bench thread
    c.bench_function("get_under_concurrent_writes", |b| {
        let (_temp, store) = setup_store(SyncStrategy::None);
        for i in 0..16 {
            store.set(format!("k{}", i).as_bytes(), b"init").unwrap();
        }
        let stop = std::sync::atomic::AtomicBool::new(false);
        std::thread::scope(|s| {
            s.spawn(|| {
                let mut i = 0u64;
                while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                    let key = format!("k{}", i % 16);
                    store.set(key.as_bytes(), &i.to_le_bytes()).unwrap();
                    i += 1;
                }
            });
            let mut i = 0usize;
            b.iter(|| {
                i = i.wrapping_add(1);
                store.get(format!("k{}", i % 16).as_bytes()).unwrap()
            });
            stop.store(true, std::sync::atomic::Ordering::Relaxed);
        });
    });
}

criterion_group!(benches, storage_benchmarks);
criterion_main!(benches);
