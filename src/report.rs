//! Elapsed-time measurement and the run summary.

use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::config::WorkerPlan;
use crate::platform;
use crate::worker::WorkerReport;

/// Wall-clock and process CPU time since `start`.
#[derive(Clone, Copy, Debug)]
pub struct Stopwatch {
    wall: Instant,
    cpu: Option<Duration>,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            wall: Instant::now(),
            cpu: platform::process_cpu_time(),
        }
    }

    /// Returns `(wall, cpu)`; `cpu` is `None` where the platform cannot tell.
    pub fn elapsed(&self) -> (Duration, Option<Duration>) {
        let wall = self.wall.elapsed();
        let cpu = match (self.cpu, platform::process_cpu_time()) {
            (Some(start), Some(now)) => Some(now.saturating_sub(start)),
            _ => None,
        };
        (wall, cpu)
    }
}

/// Outcome of a complete run.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub plan: WorkerPlan,
    /// Workers that actually started. Lower than `plan.workers` only if a
    /// thread failed to spawn.
    pub workers_started: usize,
    pub wall: Duration,
    pub cpu: Option<Duration>,
    pub workers: Vec<WorkerReport>,
}

impl RunReport {
    /// Sum of all per-worker counters; `worker` is the number of reports.
    pub fn totals(&self) -> WorkerReport {
        self.workers.iter().fold(
            WorkerReport {
                worker: self.workers.len(),
                ..WorkerReport::default()
            },
            |acc, r| WorkerReport {
                allocations: acc.allocations + r.allocations,
                frees: acc.frees + r.frees,
                retires: acc.retires + r.retires,
                foreign_frees: acc.foreign_frees + r.foreign_frees,
                ..acc
            },
        )
    }

    /// Write the summary line, and with `verbose` a per-worker breakdown.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W, verbose: bool) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{self}")?;
        if !verbose {
            return Ok(());
        }

        writeln!(
            out,
            "\n  {:>6}   {:>12}   {:>12}   {:>8}   {:>12}",
            "worker", "allocs", "frees", "retires", "foreign"
        )?;
        writeln!(
            out,
            "  {:->6}   {:->12}   {:->12}   {:->8}   {:->12}",
            "", "", "", "", ""
        )?;
        for r in &self.workers {
            writeln!(
                out,
                "  {:>6}   {:>12}   {:>12}   {:>8}   {:>12}",
                r.worker, r.allocations, r.frees, r.retires, r.foreign_frees
            )?;
        }
        let t = self.totals();
        writeln!(
            out,
            "  {:>6}   {:>12}   {:>12}   {:>8}   {:>12}",
            "total", t.allocations, t.frees, t.retires, t.foreign_frees
        )?;

        #[cfg(feature = "stats")]
        writeln!(out, "\nCounters:\n{}", crate::stats::snapshot())?;

        Ok(())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total elapsed time for {} threads: {:.2}",
            self.workers_started,
            self.wall.as_secs_f64()
        )?;
        match self.cpu {
            Some(cpu) => write!(f, " ({:.4} CPU)", cpu.as_secs_f64()),
            None => write!(f, " (CPU n/a)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkloadConfig;

    fn report(cpu: Option<Duration>) -> RunReport {
        RunReport {
            plan: WorkerPlan::new(&WorkloadConfig::single_threaded(10, 10)).unwrap(),
            workers_started: 2,
            wall: Duration::from_millis(1_250),
            cpu,
            workers: vec![
                WorkerReport {
                    worker: 0,
                    allocations: 10,
                    frees: 10,
                    retires: 1,
                    foreign_frees: 4,
                },
                WorkerReport {
                    worker: 1,
                    allocations: 7,
                    frees: 7,
                    retires: 0,
                    foreign_frees: 4,
                },
            ],
        }
    }

    #[test]
    fn test_summary_line() {
        let r = report(Some(Duration::from_millis(2_500)));
        assert_eq!(
            r.to_string(),
            "Total elapsed time for 2 threads: 1.25 (2.5000 CPU)"
        );
        assert_eq!(
            report(None).to_string(),
            "Total elapsed time for 2 threads: 1.25 (CPU n/a)"
        );
    }

    #[test]
    fn test_totals() {
        let t = report(None).totals();
        assert_eq!(t.worker, 2);
        assert_eq!(t.allocations, 17);
        assert_eq!(t.frees, 17);
        assert_eq!(t.retires, 1);
        assert_eq!(t.foreign_frees, 8);
    }

    #[test]
    fn test_verbose_breakdown() {
        let mut out = Vec::new();
        report(None).write_to(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total elapsed time"));
        assert!(text.contains("total"));
    }

    #[test]
    fn test_stopwatch_advances() {
        let sw = Stopwatch::start();
        std::thread::sleep(Duration::from_millis(5));
        let (wall, _) = sw.elapsed();
        assert!(wall >= Duration::from_millis(5));
    }
}
