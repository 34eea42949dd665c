//! CPU worker that walks one chunk of the keyspace.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::crypto::Address;
use crate::matcher::MatchPredicate;

use super::{CandidateEvaluator, Found, MiningError, ProgressEntry, ProgressSink, SearchRange};

/// Accumulators for one search run. Created when the run starts and dropped
/// when it returns.
pub(crate) struct SearchState {
    halt: AtomicBool,
    found: Mutex<Option<Found>>,
    failure: Mutex<Option<MiningError>>,
    visited: AtomicU64,
    started: Instant,
}

impl SearchState {
    pub(crate) fn new() -> Self {
        Self {
            halt: AtomicBool::new(false),
            found: Mutex::new(None),
            failure: Mutex::new(None),
            visited: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[inline]
    pub(crate) fn is_halted(&self) -> bool {
        self.halt.load(Ordering::Acquire)
    }

    pub(crate) fn halt(&self) {
        self.halt.store(true, Ordering::Release);
    }

    /// Records a match. Only the first caller wins; returns whether it did.
    pub(crate) fn commit(&self, candidate: u64, address: Address) -> bool {
        let mut slot = self.found.lock().unwrap_or_else(PoisonError::into_inner);
        let won = slot.is_none();
        if won {
            *slot = Some(Found {
                candidate,
                address,
                elapsed: self.elapsed(),
            });
        }
        self.halt();
        won
    }

    /// Records a fatal error. Only the first one is kept.
    pub(crate) fn fail(&self, error: MiningError) {
        let mut slot = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
        }
        self.halt();
    }

    pub(crate) fn take_found(&self) -> Option<Found> {
        self.found
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn take_failure(&self) -> Option<MiningError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub(crate) fn visited(&self) -> u64 {
        self.visited.load(Ordering::Relaxed)
    }
}

/// Sent back to the engine when a worker stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkReport {
    pub range: SearchRange,
    /// Candidates evaluated.
    pub visited: u64,
    /// True if every candidate in the range was evaluated.
    pub completed: bool,
}

/// A CPU worker bound to one chunk.
pub(crate) struct CpuWorker<'a, E: ?Sized, P: ?Sized> {
    range: SearchRange,
    evaluator: &'a E,
    predicate: &'a P,
    state: &'a SearchState,
    stop_flag: &'a AtomicBool,
    progress: &'a dyn ProgressSink,
    report_tx: Sender<ChunkReport>,
}

impl<'a, E, P> CpuWorker<'a, E, P>
where
    E: CandidateEvaluator + ?Sized,
    P: MatchPredicate + ?Sized,
{
    pub(crate) fn new(
        range: SearchRange,
        evaluator: &'a E,
        predicate: &'a P,
        state: &'a SearchState,
        stop_flag: &'a AtomicBool,
        progress: &'a dyn ProgressSink,
        report_tx: Sender<ChunkReport>,
    ) -> Self {
        Self {
            range,
            evaluator,
            predicate,
            state,
            stop_flag,
            progress,
            report_tx,
        }
    }

    /// Runs the worker loop.
    ///
    /// Evaluates candidates in ascending order until:
    /// - The chunk is exhausted
    /// - Any worker commits a match or a failure (halt flag)
    /// - The external stop flag is set
    ///
    /// Both flags are checked before every candidate. The progress line and
    /// the report are emitted when the loop ends, even if the evaluator panics.
    pub(crate) fn run(&self) {
        let mut finish = ChunkFinish {
            worker: self,
            visited: 0,
            completed: false,
        };

        for candidate in self.range.start..=self.range.end {
            if self.state.is_halted() || self.stop_flag.load(Ordering::Relaxed) {
                return;
            }

            let address = match self.evaluator.evaluate(candidate) {
                Ok(address) => address,
                Err(source) => {
                    self.state.fail(MiningError::Evaluation { candidate, source });
                    return;
                }
            };
            finish.visited += 1;

            if self.predicate.is_match(&address) && self.state.commit(candidate, address) {
                tracing::info!(candidate, %address, "match found");
            }
        }
        finish.completed = true;
    }

    /// Returns the chunk this worker owns.
    pub(crate) fn range(&self) -> SearchRange {
        self.range
    }
}

/// Writes the progress line and sends the report when a worker stops,
/// including when it unwinds.
struct ChunkFinish<'w, 'a, E: ?Sized, P: ?Sized> {
    worker: &'w CpuWorker<'a, E, P>,
    visited: u64,
    completed: bool,
}

impl<E: ?Sized, P: ?Sized> Drop for ChunkFinish<'_, '_, E, P> {
    fn drop(&mut self) {
        let worker = self.worker;
        worker.state.visited.fetch_add(self.visited, Ordering::Relaxed);
        worker.progress.record(&ProgressEntry {
            chunk_start: worker.range.start,
            chunk_end: worker.range.end,
            elapsed: worker.state.elapsed(),
        });

        // The engine drains reports after joining; a closed channel is harmless.
        let _ = worker.report_tx.send(ChunkReport {
            range: worker.range,
            visited: self.visited,
            completed: self.completed,
        });
    }
}
