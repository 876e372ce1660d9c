//! kvfiles stress driver
//!
//! Hammers a fresh store with concurrent writers and readers and verifies
//! that every key converged.

use std::fs;
use std::path::Path;

use clap::Parser;
use kvfiles::stress::{self, StressConfig};
use kvfiles::{Config, Storage, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// kvfiles stress driver
#[derive(Parser, Debug)]
#[command(name = "kvfiles-stress")]
#[command(about = "Concurrent load and consistency check for kvfiles")]
#[command(version)]
struct Args {
    /// Data directory (wiped before the run)
    #[arg(short, long, default_value = "./kvdata")]
    data_dir: String,

    /// Number of distinct keys
    #[arg(short, long, default_value = "16")]
    keys: usize,

    /// Writer threads
    #[arg(short, long, default_value = "8")]
    writers: usize,

    /// Reader threads
    #[arg(short, long, default_value = "16")]
    readers: usize,

    /// Operations per thread
    #[arg(short, long, default_value = "5000")]
    ops: usize,

    /// Cache shards
    #[arg(short, long, default_value = "64")]
    shards: usize,

    /// Skip fsync (rename-only writes)
    #[arg(long)]
    no_sync: bool,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvfiles=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("kvfiles stress v{}", kvfiles::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    if let Err(e) = reset_dir(Path::new(&args.data_dir)) {
        tracing::error!("Failed to clear data directory: {}", e);
        std::process::exit(1);
    }

    let sync = if args.no_sync {
        SyncStrategy::None
    } else {
        SyncStrategy::File
    };
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .shard_count(args.shards)
        .sync_strategy(sync)
        .build();

    let store = match Storage::open(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let workload = StressConfig {
        keys: args.keys,
        writers: args.writers,
        readers: args.readers,
        ops_per_worker: args.ops,
    };

    let report = match stress::run(&store, &workload) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Stress run failed: {}", e);
            std::process::exit(1);
        }
    };

    let stats = store.stats();
    println!("DONE in {:?}", report.elapsed);
    println!("writeOps:   {}", report.write_ops);
    println!("readOps:    {}", report.read_ops);
    println!("mismatches: {}", report.mismatches());
    println!("inmem keys: {}", report.cached_keys);
    println!("hit rate:   {:.3}", stats.hit_rate());

    if !report.is_clean() {
        tracing::error!(?report, "consistency check failed");
        std::process::exit(2);
    }
}

/// Start from an empty directory
fn reset_dir(dir: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
