//! Thread orchestration for a complete run.
//!
//! The harness normalizes the configuration, starts the clock, fills the
//! foreign pool, then starts one scoped thread per worker. Workers share the
//! plan, the histogram and the allocator by reference; the only memory they
//! share is the foreign pool, already split into disjoint inboxes. The clock
//! stops once every worker has joined and the pool is torn down.

use core::alloc::GlobalAlloc;
use std::thread;

use tracing::{error, info, warn};

use crate::config::{WorkerPlan, WorkloadConfig};
use crate::error::{Error, Result};
use crate::foreign::{ForeignInbox, ForeignPool};
use crate::histogram::Histogram;
use crate::report::{RunReport, Stopwatch};
use crate::worker::{Worker, WorkerReport};

/// What to do when a worker hits a fatal error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnFailure {
    /// Log and terminate the process from the failing thread, abandoning
    /// every other worker.
    #[default]
    Exit,
    /// Let the remaining workers finish, then return the first error.
    Report,
}

pub struct Harness<'a, A: GlobalAlloc + Sync + ?Sized> {
    alloc: &'a A,
    config: WorkloadConfig,
    histogram: &'a Histogram,
    on_failure: OnFailure,
}

impl<'a, A: GlobalAlloc + Sync + ?Sized> Harness<'a, A> {
    pub fn new(alloc: &'a A, config: WorkloadConfig, histogram: &'a Histogram) -> Self {
        Self {
            alloc,
            config,
            histogram,
            on_failure: OnFailure::default(),
        }
    }

    pub fn on_failure(mut self, policy: OnFailure) -> Self {
        self.on_failure = policy;
        self
    }

    /// Run every worker to completion and measure the elapsed time.
    pub fn run(&self) -> Result<RunReport> {
        let plan = WorkerPlan::new(&self.config)?;
        info!(
            workers = plan.workers,
            slots_per_worker = plan.heap_slots_per_worker,
            iterations_per_worker = plan.iterations_per_worker,
            foreign = plan.foreign_total,
            "starting workload"
        );

        let stopwatch = Stopwatch::start();

        let mut pool = if plan.foreign_total > 0 {
            Some(ForeignPool::populate(
                self.alloc,
                &plan,
                self.histogram.first_size(),
            )?)
        } else {
            None
        };
        let inboxes = pool.as_mut().map(ForeignPool::inboxes).unwrap_or_default();

        let (workers_started, results) = self.spawn_all(&plan, inboxes);
        drop(pool);

        let (wall, cpu) = stopwatch.elapsed();

        let mut workers = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(report) => workers.push(report),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        let report = RunReport {
            plan,
            workers_started,
            wall,
            cpu,
            workers,
        };
        info!(
            wall_secs = report.wall.as_secs_f64(),
            cpu_secs = report.cpu.map(|c| c.as_secs_f64()),
            "workload finished"
        );
        Ok(report)
    }

    fn spawn_all(
        &self,
        plan: &WorkerPlan,
        inboxes: Vec<ForeignInbox<'_, A>>,
    ) -> (usize, Vec<Result<WorkerReport>>) {
        let alloc = self.alloc;
        let histogram = self.histogram;
        let on_failure = self.on_failure;
        let mut inboxes = inboxes.into_iter();

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(plan.workers);
            for id in 0..plan.workers {
                let inbox = inboxes.next();
                let spawned = thread::Builder::new()
                    .name(format!("sh8bench-worker-{id}"))
                    .spawn_scoped(scope, move || {
                        let result = Worker::new(id, alloc, plan, histogram, inbox)
                            .and_then(Worker::run);
                        if let Err(e) = &result {
                            fail(id, e, on_failure);
                        }
                        result
                    });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => warn!(worker = id, error = %e, "failed to start worker thread"),
                }
            }

            let started = handles.len();
            let results = handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(result) => result,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect();
            (started, results)
        })
    }
}

fn fail(worker: usize, e: &Error, policy: OnFailure) {
    error!(worker, error = %e, "fatal workload failure");
    if policy == OnFailure::Exit {
        std::process::exit(1);
    }
}

/// Run `config` against `alloc` with the default failure policy.
pub fn run<A: GlobalAlloc + Sync + ?Sized>(
    alloc: &A,
    config: WorkloadConfig,
    histogram: &Histogram,
) -> Result<RunReport> {
    Harness::new(alloc, config, histogram).run()
}
