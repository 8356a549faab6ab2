//! Error taxonomy for the workload engine.
//!
//! Every variant is fatal to a benchmark run. Nothing here is retried: a run
//! under memory pressure or with corrupted bookkeeping produces meaningless
//! timings, so callers stop as soon as one of these surfaces.

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The allocator under test returned null for a workload request.
    #[error("out of memory allocating {size} bytes")]
    OutOfMemory { size: usize },

    /// A foreign block's back-reference does not name the slot it was found in.
    #[error("foreign slot {slot} holds a block tagged for slot {found}")]
    CorruptTag { slot: usize, found: usize },

    /// Harness bookkeeping could not be reserved before the run.
    #[error("unable to allocate {what}")]
    Setup {
        what: &'static str,
        #[source]
        source: TryReserveError,
    },

    #[error("heap of {heap_slots} slots leaves no slot for each of {workers} workers")]
    NoSlots { heap_slots: usize, workers: usize },

    #[error("histogram has no buckets")]
    EmptyHistogram,

    #[error("histogram bucket {index} has a zero block size")]
    ZeroBlockSize { index: usize },

    #[error("invalid histogram file: {0}")]
    HistogramParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
