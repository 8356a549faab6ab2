//! Per-worker control loop.
//!
//! Each iteration drains pending foreign frees, takes the next histogram
//! bucket and issues its requests through the worker's [`LiveSlots`]. When the
//! iterations are done, any foreign blocks still owed are freed, then every
//! residual live block.

use core::alloc::GlobalAlloc;

use tracing::debug;

use crate::config::WorkerPlan;
use crate::error::Result;
use crate::foreign::ForeignInbox;
use crate::histogram::{Histogram, HistogramEntry};
use crate::slots::LiveSlots;

/// What one worker did during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: usize,
    /// Blocks allocated into live slots.
    pub allocations: u64,
    /// Live-slot blocks freed, including shutdown cleanup.
    pub frees: u64,
    pub retires: u64,
    /// Foreign blocks this worker freed.
    pub foreign_frees: u64,
}

pub struct Worker<'a, A: GlobalAlloc + ?Sized> {
    id: usize,
    plan: WorkerPlan,
    histogram: &'a Histogram,
    slots: LiveSlots<'a, A>,
    inbox: Option<ForeignInbox<'a, A>>,
}

impl<'a, A: GlobalAlloc + ?Sized> Worker<'a, A> {
    /// Set up worker `id`: reserves its slot buffer up front.
    pub fn new(
        id: usize,
        alloc: &'a A,
        plan: &WorkerPlan,
        histogram: &'a Histogram,
        inbox: Option<ForeignInbox<'a, A>>,
    ) -> Result<Self> {
        Ok(Self {
            id,
            plan: *plan,
            histogram,
            slots: LiveSlots::new(alloc, plan.heap_slots_per_worker)?,
            inbox,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run the workload to completion.
    pub fn run(mut self) -> Result<WorkerReport> {
        debug!(
            worker = self.id,
            slots = self.slots.capacity(),
            iterations = self.plan.iterations_per_worker,
            foreign = self.inbox.as_ref().map_or(0, |i| i.remaining()),
            "worker started"
        );

        let mut foreign_frees = 0;
        let mut sizes = self.histogram.cursor();

        for _ in 0..self.plan.iterations_per_worker {
            if let Some(inbox) = self.inbox.as_mut() {
                foreign_frees += inbox.drain(self.plan.foreign_burst)?;
            }

            let Some(HistogramEntry { size, count }) = sizes.next() else {
                break;
            };
            for _ in 0..count {
                self.slots.allocate(size)?;
            }
        }

        if let Some(inbox) = self.inbox.as_mut() {
            foreign_frees += inbox.drain(None)?;
        }
        self.slots.release_all();

        let report = WorkerReport {
            worker: self.id,
            allocations: self.slots.allocated(),
            frees: self.slots.freed(),
            retires: self.slots.retires(),
            foreign_frees,
        };
        debug!(
            worker = self.id,
            allocations = report.allocations,
            retires = report.retires,
            foreign_frees = report.foreign_frees,
            "worker finished"
        );
        Ok(report)
    }
}
