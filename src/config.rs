//! Workload configuration and its normalized per-worker plan.
//!
//! Defaults are generated by `build.rs` from `sh8bench.toml` (or the file
//! named by `SH8BENCH_CONFIG`).

use tracing::{debug, warn};

use crate::error::{Error, Result};

include!(concat!(env!("OUT_DIR"), "/config_gen.rs"));

/// Run-wide configuration, as supplied by the user. Immutable for the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkloadConfig {
    /// Live block slots across all workers.
    pub heap_slots: usize,
    /// Driver iterations across all workers.
    pub iterations: usize,
    pub workers: usize,
    /// Blocks allocated up front and freed by worker threads.
    pub foreign_allocs: usize,
    /// Per-iteration cap on foreign frees; `None` drains all that is pending.
    pub foreign_burst: Option<usize>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            heap_slots: DEFAULT_HEAP_SLOTS,
            iterations: DEFAULT_ITERATIONS,
            workers: DEFAULT_THREADS,
            foreign_allocs: DEFAULT_FOREIGN_ALLOCS,
            foreign_burst: DEFAULT_FOREIGN_BURST,
        }
    }
}

impl WorkloadConfig {
    /// A one-worker configuration with no cross-thread frees.
    pub fn single_threaded(heap_slots: usize, iterations: usize) -> Self {
        Self {
            heap_slots,
            iterations,
            workers: 1,
            foreign_allocs: 0,
            foreign_burst: None,
        }
    }
}

/// The normalized shares every worker runs with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerPlan {
    pub workers: usize,
    pub heap_slots_per_worker: usize,
    pub iterations_per_worker: usize,
    /// Foreign pool size, an exact multiple of `workers²`.
    pub foreign_total: usize,
    /// Blocks each worker frees from the pool (`foreign_total / workers`).
    pub foreign_quota: usize,
    /// Consecutive frees from one producer segment (`foreign_quota / workers`).
    pub foreign_chunk: usize,
    pub foreign_burst: Option<usize>,
}

impl WorkerPlan {
    pub fn new(config: &WorkloadConfig) -> Result<Self> {
        let workers = if config.workers == 0 {
            warn!("worker count of 0 raised to 1");
            1
        } else {
            config.workers
        };

        let heap_slots_per_worker = config.heap_slots / workers;
        if heap_slots_per_worker == 0 {
            return Err(Error::NoSlots {
                heap_slots: config.heap_slots,
                workers,
            });
        }

        // Round down so the pool splits into a workers x workers grid.
        let grid = workers.saturating_mul(workers);
        let foreign_total = config.foreign_allocs / grid * grid;
        if foreign_total != config.foreign_allocs {
            debug!(
                requested = config.foreign_allocs,
                normalized = foreign_total,
                "foreign allocation count rounded down to a multiple of workers squared"
            );
        }
        let foreign_quota = foreign_total / workers;

        Ok(Self {
            workers,
            heap_slots_per_worker,
            iterations_per_worker: config.iterations / workers,
            foreign_total,
            foreign_quota,
            foreign_chunk: foreign_quota / workers,
            foreign_burst: config.foreign_burst.filter(|&b| b > 0),
        })
    }
}
