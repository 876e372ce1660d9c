//! Stress harness
//!
//! Drives a [`Storage`] with concurrent writers and readers through its public
//! `get`/`set` API, then checks that every key converged.
//!
//! ## Checks
//! - No read of a pre-initialized key comes back absent
//! - Each key's final value is the last value some writer wrote to it (or the
//!   initial value if nobody wrote it)
//! - Each key's final in-memory value equals its backing file

use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::error::Result;
use crate::store::Storage;

/// Writers pause for a millisecond every this many writes
const WRITER_PAUSE_EVERY: usize = 200;

/// Readers pause for a millisecond every this many reads
const READER_PAUSE_EVERY: usize = 500;

/// Workload shape
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Distinct keys the workers pick from
    pub keys: usize,
    /// Writer threads
    pub writers: usize,
    /// Reader threads
    pub readers: usize,
    /// Operations per thread
    pub ops_per_worker: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            keys: 16,
            writers: 8,
            readers: 16,
            ops_per_worker: 5000,
        }
    }
}

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StressReport {
    pub write_ops: u64,
    pub read_ops: u64,
    /// Reads that found no value for a key that always had one
    pub missing_reads: u64,
    /// Keys whose final value no writer could have left behind
    pub final_mismatches: u64,
    /// Keys whose memory and disk disagree
    pub divergent_keys: u64,
    /// Keys held in memory at the end
    pub cached_keys: usize,
    pub elapsed: Duration,
}

impl StressReport {
    /// Sum of every kind of failure
    pub fn mismatches(&self) -> u64 {
        self.missing_reads + self.final_mismatches + self.divergent_keys
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches() == 0
    }
}

/// Key name for slot `i`
pub fn key_name(i: usize) -> String {
    format!("k{:02}.txt", i)
}

/// Run the workload against `store`
///
/// Worker errors abort the run and are returned.
pub fn run(store: &Storage, config: &StressConfig) -> Result<StressReport> {
    let keys: Vec<String> = (0..config.keys.max(1)).map(key_name).collect();

    // Every key starts with a known value
    for key in &keys {
        store.set(key.as_bytes(), format!("init_{}", key).as_bytes())?;
    }

    let write_ops = AtomicU64::new(0);
    let read_ops = AtomicU64::new(0);
    let missing_reads = AtomicU64::new(0);
    let start = Barrier::new(config.writers + config.readers);
    let started = Instant::now();

    let last_writes = thread::scope(|s| -> Result<Vec<HashMap<usize, Vec<u8>>>> {
        let writers: Vec<_> = (0..config.writers)
            .map(|id| {
                let (keys, start, write_ops) = (&keys, &start, &write_ops);
                s.spawn(move || -> Result<HashMap<usize, Vec<u8>>> {
                    let mut rng = rand::thread_rng();
                    let mut last = HashMap::new();
                    start.wait();
                    for i in 0..config.ops_per_worker {
                        let slot = rng.gen_range(0..keys.len());
                        let value = format!("w{}_i{}", id, i).into_bytes();
                        store.set(keys[slot].as_bytes(), &value)?;
                        last.insert(slot, value);
                        write_ops.fetch_add(1, Ordering::Relaxed);
                        if i % WRITER_PAUSE_EVERY == 0 {
                            thread::sleep(Duration::from_millis(1));
                        }
                    }
                    Ok(last)
                })
            })
            .collect();

        let readers: Vec<_> = (0..config.readers)
            .map(|_| {
                let (keys, start, read_ops, missing_reads) =
                    (&keys, &start, &read_ops, &missing_reads);
                s.spawn(move || -> Result<()> {
                    let mut rng = rand::thread_rng();
                    start.wait();
                    for i in 0..config.ops_per_worker {
                        let key = &keys[rng.gen_range(0..keys.len())];
                        if store.get(key.as_bytes())?.is_none() {
                            missing_reads.fetch_add(1, Ordering::Relaxed);
                        }
                        read_ops.fetch_add(1, Ordering::Relaxed);
                        if i % READER_PAUSE_EVERY == 0 {
                            thread::sleep(Duration::from_millis(1));
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        for reader in readers {
            join_worker(reader)?;
        }
        writers.into_iter().map(join_worker).collect()
    })?;

    // Stabilization: check every key against what writers could have left
    let mut candidates: HashMap<usize, HashSet<Vec<u8>>> = HashMap::new();
    for per_writer in last_writes {
        for (slot, value) in per_writer {
            candidates.entry(slot).or_default().insert(value);
        }
    }

    let mut final_mismatches = 0;
    let mut divergent_keys = 0;
    for (slot, key) in keys.iter().enumerate() {
        let got = store.get(key.as_bytes())?;
        let on_disk = fs::read(crate::key::path_for(store.data_dir(), key.as_bytes())?)?;

        let acceptable = match (&got, candidates.get(&slot)) {
            (Some(value), Some(values)) => values.contains(value),
            (Some(value), None) => *value == format!("init_{}", key).into_bytes(),
            (None, _) => false,
        };
        if !acceptable {
            tracing::warn!(key = %key, got = ?got.as_deref().map(String::from_utf8_lossy), "final value mismatch");
            final_mismatches += 1;
        }
        if got.as_deref() != Some(on_disk.as_slice()) {
            tracing::warn!(key = %key, "memory and disk diverged");
            divergent_keys += 1;
        }
    }

    Ok(StressReport {
        write_ops: write_ops.into_inner(),
        read_ops: read_ops.into_inner(),
        missing_reads: missing_reads.into_inner(),
        final_mismatches,
        divergent_keys,
        cached_keys: store.cached_len(),
        elapsed: started.elapsed(),
    })
}

fn join_worker<T>(handle: thread::ScopedJoinHandle<'_, Result<T>>) -> Result<T> {
    match handle.join() {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
