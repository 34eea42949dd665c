//! Bounded-parallel exhaustive search over an integer keyspace.
//!
//! This module provides:
//! - Partitioning of `[start, limit]` into fixed-size chunks
//! - Batched dispatch of chunks to CPU worker threads
//! - Cooperative termination on the first match or on external cancellation
//! - An append-only progress log, one line per finished chunk

mod cpu;
mod engine;
mod evaluator;
mod progress;
mod range;

pub use cpu::ChunkReport;
pub use engine::{EngineStatus, Found, MiningEngine, SearchOutcome, SearchReport};
pub use evaluator::{
    CandidateEvaluator, KeyEvaluator, NonceEvaluator, PreimageEvaluator, SaltEvaluator,
};
pub use progress::{NoProgress, ProgressEntry, ProgressLog, ProgressSink};
pub use range::{Chunks, SearchConfig, SearchRange};

use crate::crypto::CryptoError;

/// Errors that abort a search.
#[derive(Debug, thiserror::Error)]
pub enum MiningError {
    #[error("invalid search config: {0}")]
    InvalidConfig(String),

    #[error("candidate {candidate} could not be evaluated: {source}")]
    Evaluation {
        candidate: u64,
        #[source]
        source: CryptoError,
    },

    #[error("worker for chunk {start} - {end} panicked: {message}")]
    WorkerPanicked { start: u64, end: u64, message: String },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}
