//! Workload statistics counters.
//!
//! All counters use `Relaxed` ordering. They are observational only; the
//! workload never synchronizes through them, so enabling the `stats` feature
//! adds no ordering between workers beyond what the allocator itself does.
//!
//! # Usage
//!
//! ```ignore
//! let snap = sh8bench::stats::snapshot();
//! println!("allocs: {}", snap.allocs);
//! ```
//!
//! Individual counter loads are atomic but the snapshot as a whole is not
//! consistent with concurrently running workers.

use core::sync::atomic::{AtomicU64, Ordering};
use std::fmt;

pub(crate) struct Stats {
    /// Blocks obtained for live slots.
    pub allocs: AtomicU64,
    /// Sum of requested byte sizes for live-slot blocks.
    pub alloc_bytes: AtomicU64,
    /// Live-slot blocks released (retire events and shutdown).
    pub frees: AtomicU64,
    /// Buffer-wide retire events.
    pub retires: AtomicU64,
    /// Tagged blocks written into the foreign pool.
    pub foreign_allocs: AtomicU64,
    /// Tagged blocks released by a draining worker.
    pub foreign_frees: AtomicU64,
}

impl Stats {
    const fn new() -> Self {
        Self {
            allocs: AtomicU64::new(0),
            alloc_bytes: AtomicU64::new(0),
            frees: AtomicU64::new(0),
            retires: AtomicU64::new(0),
            foreign_allocs: AtomicU64::new(0),
            foreign_frees: AtomicU64::new(0),
        }
    }
}

pub(crate) static STATS: Stats = Stats::new();

/// A point-in-time copy of the workload counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub allocs: u64,
    pub alloc_bytes: u64,
    pub frees: u64,
    pub retires: u64,
    pub foreign_allocs: u64,
    pub foreign_frees: u64,
}

/// Load all counters with `Relaxed` ordering.
pub fn snapshot() -> Snapshot {
    let s = &STATS;
    Snapshot {
        allocs: s.allocs.load(Ordering::Relaxed),
        alloc_bytes: s.alloc_bytes.load(Ordering::Relaxed),
        frees: s.frees.load(Ordering::Relaxed),
        retires: s.retires.load(Ordering::Relaxed),
        foreign_allocs: s.foreign_allocs.load(Ordering::Relaxed),
        foreign_frees: s.foreign_frees.load(Ordering::Relaxed),
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {:<16} {:>14}", "allocs", self.allocs)?;
        writeln!(f, "  {:<16} {:>14}", "alloc bytes", self.alloc_bytes)?;
        writeln!(f, "  {:<16} {:>14}", "frees", self.frees)?;
        writeln!(f, "  {:<16} {:>14}", "retire events", self.retires)?;
        writeln!(f, "  {:<16} {:>14}", "foreign allocs", self.foreign_allocs)?;
        write!(f, "  {:<16} {:>14}", "foreign frees", self.foreign_frees)
    }
}
