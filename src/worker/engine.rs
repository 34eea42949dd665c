//! Batched, bounded-parallel search driver.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

use crate::crypto::Address;
use crate::matcher::MatchPredicate;

use super::cpu::{CpuWorker, SearchState};
use super::{
    CandidateEvaluator, ChunkReport, MiningError, NoProgress, ProgressSink, SearchConfig,
    SearchRange,
};

/// The first match of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Found {
    /// The candidate that produced the address.
    pub candidate: u64,
    pub address: Address,
    /// Time from search start to the match.
    pub elapsed: Duration,
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Found),
    /// Every candidate was evaluated without a match.
    Exhausted,
    /// The stop flag was raised before the domain was covered.
    Cancelled,
}

/// Outcome plus counters for one search run.
#[derive(Debug, Clone, Copy)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub candidates_visited: u64,
    pub chunks_completed: u64,
    pub elapsed: Duration,
}

impl SearchReport {
    pub fn found(&self) -> Option<&Found> {
        match &self.outcome {
            SearchOutcome::Found(found) => Some(found),
            _ => None,
        }
    }

    /// Candidates evaluated per second.
    pub fn candidates_per_second(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            self.candidates_visited as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineStatus {
    Idle = 0,
    Running = 1,
    Found = 2,
    Exhausted = 3,
    Cancelled = 4,
    Failed = 5,
}

impl EngineStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EngineStatus::Running,
            2 => EngineStatus::Found,
            3 => EngineStatus::Exhausted,
            4 => EngineStatus::Cancelled,
            5 => EngineStatus::Failed,
            _ => EngineStatus::Idle,
        }
    }
}

/// Searches `[start, limit]` for a candidate whose address satisfies the
/// predicate.
///
/// Chunks of `interval` candidates are handed out in ascending order, at most
/// `max_workers` at a time; the engine joins each batch before dispatching
/// the next. The first worker to find a match raises a shared halt flag that
/// every worker checks before each candidate.
pub struct MiningEngine<E, P> {
    config: SearchConfig,
    evaluator: E,
    predicate: P,
    progress: Box<dyn ProgressSink>,
    stop_flag: Arc<AtomicBool>,
    status: AtomicU8,
}

impl<E, P> MiningEngine<E, P>
where
    E: CandidateEvaluator,
    P: MatchPredicate,
{
    /// Creates an engine after validating `config`.
    pub fn new(config: SearchConfig, evaluator: E, predicate: P) -> Result<Self, MiningError> {
        config.validate()?;
        Ok(Self {
            config,
            evaluator,
            predicate,
            progress: Box::new(NoProgress),
            stop_flag: Arc::new(AtomicBool::new(false)),
            status: AtomicU8::new(EngineStatus::Idle as u8),
        })
    }

    /// Sends one line per finished chunk to `sink`.
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Box::new(sink);
        self
    }

    /// Uses an externally owned stop flag (e.g. one set by a signal handler).
    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = stop_flag;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Signals all workers to stop at their next candidate.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Returns true if the engine has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Returns a clone of the stop flag for external use (e.g., signal handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Runs the search to completion, cancellation or failure.
    pub fn run(&self) -> Result<SearchReport, MiningError> {
        self.set_status(EngineStatus::Running);
        let result = self.search();
        let status = match &result {
            Ok(report) => match report.outcome {
                SearchOutcome::Found(_) => EngineStatus::Found,
                SearchOutcome::Exhausted => EngineStatus::Exhausted,
                SearchOutcome::Cancelled => EngineStatus::Cancelled,
            },
            Err(_) => EngineStatus::Failed,
        };
        self.set_status(status);
        result
    }

    fn set_status(&self, status: EngineStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    fn search(&self) -> Result<SearchReport, MiningError> {
        let config = &self.config;
        info!(
            start = config.start,
            limit = config.limit,
            interval = config.interval,
            max_workers = config.max_workers,
            "search started"
        );

        let state = SearchState::new();
        let (report_tx, report_rx) = unbounded();
        let mut chunks = config.chunks().peekable();
        let mut chunks_completed = 0u64;
        let mut all_completed = true;

        while !state.is_halted() && !self.is_stopped() {
            let batch: Vec<SearchRange> = chunks.by_ref().take(config.max_workers).collect();
            if batch.is_empty() {
                break;
            }

            let joined = self.run_batch(&batch, &state, &report_tx);
            let (done, batch_completed) = drain_reports(&report_rx);
            chunks_completed += done;
            all_completed &= batch_completed;

            joined?;
            if let Some(error) = state.take_failure() {
                warn!(error = %error, "search aborted");
                return Err(error);
            }
        }

        let outcome = if let Some(found) = state.take_found() {
            SearchOutcome::Found(found)
        } else if all_completed && chunks.peek().is_none() {
            SearchOutcome::Exhausted
        } else {
            SearchOutcome::Cancelled
        };

        let report = SearchReport {
            outcome,
            candidates_visited: state.visited(),
            chunks_completed,
            elapsed: state.elapsed(),
        };
        info!(
            outcome = ?report.outcome,
            visited = report.candidates_visited,
            chunks = report.chunks_completed,
            elapsed = ?report.elapsed,
            "search finished"
        );
        Ok(report)
    }

    /// Spawns one worker per chunk and joins them all.
    fn run_batch(
        &self,
        batch: &[SearchRange],
        state: &SearchState,
        report_tx: &Sender<ChunkReport>,
    ) -> Result<(), MiningError> {
        thread::scope(|scope| {
            let mut result = Ok(());
            let mut handles = Vec::with_capacity(batch.len());

            for range in batch {
                let worker = CpuWorker::new(
                    *range,
                    &self.evaluator,
                    &self.predicate,
                    state,
                    &self.stop_flag,
                    &*self.progress,
                    report_tx.clone(),
                );
                let spawned = thread::Builder::new()
                    .name(format!("addrgen-worker-{}", worker.range().start))
                    .spawn_scoped(scope, move || worker.run());
                match spawned {
                    Ok(handle) => handles.push((*range, handle)),
                    Err(e) => {
                        state.halt();
                        result = Err(MiningError::Spawn(e));
                        break;
                    }
                }
            }

            for (range, handle) in handles {
                if let Err(payload) = handle.join() {
                    state.halt();
                    let message = panic_message(payload.as_ref());
                    warn!(start = range.start, end = range.end, %message, "worker panicked");
                    if result.is_ok() {
                        result = Err(MiningError::WorkerPanicked {
                            start: range.start,
                            end: range.end,
                            message,
                        });
                    }
                }
            }
            result
        })
    }
}

/// Collects reports of the batch just joined.
fn drain_reports(report_rx: &Receiver<ChunkReport>) -> (u64, bool) {
    let mut done = 0;
    let mut completed = true;
    for report in report_rx.try_iter() {
        debug!(
            start = report.range.start,
            end = report.range.end,
            visited = report.visited,
            completed = report.completed,
            "chunk finished"
        );
        done += 1;
        completed &= report.completed;
    }
    (done, completed)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
