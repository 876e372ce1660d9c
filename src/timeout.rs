//! Call-with-timeout wrapper
//!
//! Bounds how long a caller waits on a blocking function. The store itself
//! is never cancellable; callers that need a deadline wrap their calls here.
//!
//! The function runs on its own thread. On timeout the caller gets
//! [`KvError::Timeout`] right away while the function keeps running in the
//! background; its result is discarded.

use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, RecvTimeoutError};

use crate::error::{KvError, Result};

/// Run `f`, returning its output if it finishes within `timeout`
///
/// A panic inside `f` is resumed on the calling thread.
pub fn call_with_timeout<T, F>(timeout: Duration, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let start = Instant::now();
    let (tx, rx) = channel::bounded(1);

    let handle = thread::Builder::new()
        .name("kvfiles-timeout".to_string())
        .spawn(move || {
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(f());
        })?;

    let outcome = rx.recv_timeout(timeout);
    let elapsed = start.elapsed();
    tracing::debug!(?elapsed, ?timeout, "call finished waiting");

    match outcome {
        Ok(value) => Ok(value),
        Err(RecvTimeoutError::Timeout) => Err(KvError::Timeout { elapsed }),
        Err(RecvTimeoutError::Disconnected) => match handle.join() {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(()) => unreachable!("worker exited without sending a result"),
        },
    }
}
