//! Append-only progress log, one line per finished chunk.

use std::fmt;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A chunk that a worker has stopped working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEntry {
    pub chunk_start: u64,
    pub chunk_end: u64,
    /// Time since the search started.
    pub elapsed: Duration,
}

impl fmt::Display for ProgressEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}: {:?}", self.chunk_start, self.chunk_end, self.elapsed)
    }
}

/// Receives progress entries from concurrent workers. Never read back by the
/// engine.
pub trait ProgressSink: Send + Sync {
    fn record(&self, entry: &ProgressEntry);
}

/// Writes each entry as a line to `W`, flushing after every line.
pub struct ProgressLog<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> ProgressLog<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ProgressSink for ProgressLog<W> {
    fn record(&self, entry: &ProgressEntry) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{}", entry).and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "failed to write progress line");
        }
    }
}

/// Discards all entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn record(&self, _entry: &ProgressEntry) {}
}
