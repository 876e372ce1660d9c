//! kvfiles CLI
//!
//! Command-line interface for reading and writing a kvfiles directory.
//!
//! Exit codes: 0 on success, 1 on any error, 2 when `get` finds no value.
//! An absent key prints nothing on stdout and `(nil)` on stderr, so a
//! stored value of `(nil)` is never confused with a missing key.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use kvfiles::{call_with_timeout, Config, Result, Storage};
use tracing_subscriber::{fmt, EnvFilter};

/// kvfiles CLI
#[derive(Parser, Debug)]
#[command(name = "kvfiles-cli")]
#[command(about = "CLI for the kvfiles key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./kvdata")]
    data_dir: String,

    /// Give up on an operation after this many milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,kvfiles=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder().data_dir(&args.data_dir).build();
    let store = match Storage::open(config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let output = match args.timeout_ms {
        Some(ms) => {
            let store = Arc::clone(&store);
            let command = args.command;
            call_with_timeout(Duration::from_millis(ms), move || execute(&store, command))
                .and_then(|result| result)
        }
        None => execute(&store, args.command),
    };

    match output {
        Ok(Outcome::Value(value)) => print_line(&value),
        Ok(Outcome::Stored) => print_line(b"OK"),
        Ok(Outcome::Absent) => {
            eprintln!("(nil)");
            std::process::exit(2);
        }
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Result of one command
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    /// `get` found a value
    Value(Vec<u8>),

    /// `get` found no value for the key
    Absent,

    /// `set` committed
    Stored,
}

/// Run one command
fn execute(store: &Storage, command: Commands) -> Result<Outcome> {
    match command {
        Commands::Get { key } => Ok(match store.get(key.as_bytes())? {
            Some(value) => Outcome::Value(value),
            None => Outcome::Absent,
        }),
        Commands::Set { key, value } => {
            store.set(key.as_bytes(), value.as_bytes())?;
            Ok(Outcome::Stored)
        }
    }
}

fn print_line(bytes: &[u8]) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(bytes);
    let _ = stdout.write_all(b"\n");
}
