//! sh8bench binary
//!
//! Run with: `sh8bench [OPTIONS] [THREADS]`
//!
//! Values not given on the command line are prompted for when stdin is a
//! terminal (or answers come from `--input`), otherwise defaults apply.

use std::alloc::{GlobalAlloc, System};
use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sh8bench::config::{
    DEFAULT_FOREIGN_ALLOCS, DEFAULT_HEAP_SLOTS, DEFAULT_ITERATIONS, DEFAULT_THREADS,
};
use sh8bench::prompt::Prompter;
use sh8bench::{Harness, Histogram, WorkloadConfig, platform};

#[derive(Parser)]
#[command(name = "sh8bench")]
#[command(about = "Stress an allocator with a reproducible, multi-threaded workload")]
#[command(version)]
struct Cli {
    /// Worker thread count (mimalloc-bench style invocation)
    #[arg(value_name = "THREADS")]
    threads_positional: Option<usize>,

    /// Heap size in live block slots, split across workers
    #[arg(long)]
    heap_slots: Option<usize>,

    /// Workload iterations, split across workers
    #[arg(long)]
    iterations: Option<usize>,

    /// Worker thread count
    #[arg(short, long)]
    threads: Option<usize>,

    /// Allocations freed from a thread other than the allocating one
    #[arg(long)]
    foreign_allocs: Option<usize>,

    /// Maximum foreign frees per iteration (default: all pending)
    #[arg(long)]
    foreign_burst: Option<usize>,

    /// Histogram file of `[[bucket]]` tables with `size` and `count`
    #[arg(long)]
    histogram: Option<PathBuf>,

    /// Allocator under test
    #[arg(long, value_enum, default_value_t = AllocatorKind::System)]
    allocator: AllocatorKind,

    /// Read prompt answers from this file instead of stdin
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Non-interactive; threads default to the number of CPUs
    #[arg(long)]
    bench: bool,

    /// Only warnings and errors; no prompt text
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Debug logging and a per-worker breakdown
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AllocatorKind {
    System,
    Mimalloc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let histogram = match &cli.histogram {
        Some(path) => Histogram::load(path)
            .with_context(|| format!("failed to load histogram {}", path.display()))?,
        None => Histogram::default(),
    };

    let config = resolve_config(&cli)?;
    info!(allocator = ?cli.allocator, buckets = histogram.entries().len(), "configured");

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    match cli.allocator {
        AllocatorKind::System => execute(&System, config, &histogram, &mut out, cli.verbose),
        AllocatorKind::Mimalloc => execute(
            &mimalloc::MiMalloc,
            config,
            &histogram,
            &mut out,
            cli.verbose,
        ),
    }
}

fn execute<A: GlobalAlloc + Sync>(
    alloc: &A,
    config: WorkloadConfig,
    histogram: &Histogram,
    out: &mut dyn Write,
    verbose: bool,
) -> Result<()> {
    let report = Harness::new(alloc, config, histogram)
        .run()
        .context("workload failed")?;
    report.write_to(out, verbose)?;
    out.flush()?;
    Ok(())
}

/// Merge command-line values, prompt answers and defaults.
fn resolve_config(cli: &Cli) -> Result<WorkloadConfig> {
    let threads_default = if cli.bench {
        platform::available_parallelism()
    } else {
        DEFAULT_THREADS
    };
    let threads = cli.threads.or(cli.threads_positional);

    let input: Option<Box<dyn BufRead>> = match &cli.input {
        Some(path) => Some(Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        ))),
        None if !cli.bench && io::stdin().is_terminal() => Some(Box::new(io::stdin().lock())),
        None => None,
    };

    let Some(input) = input else {
        return Ok(WorkloadConfig {
            heap_slots: cli.heap_slots.unwrap_or(DEFAULT_HEAP_SLOTS),
            iterations: cli.iterations.unwrap_or(DEFAULT_ITERATIONS),
            workers: threads.unwrap_or(threads_default),
            foreign_allocs: cli.foreign_allocs.unwrap_or(DEFAULT_FOREIGN_ALLOCS),
            foreign_burst: cli.foreign_burst,
        });
    };

    let mut prompter = Prompter::new(input, io::stdout(), !cli.quiet);
    let heap_slots =
        prompter.value_or_prompt(cli.heap_slots, "heap size (# of blocks)", DEFAULT_HEAP_SLOTS)?;
    let iterations = prompter.value_or_prompt(cli.iterations, "iterations", DEFAULT_ITERATIONS)?;
    let workers = prompter.value_or_prompt(threads, "threads", threads_default)?;
    let foreign_allocs = prompter.value_or_prompt(
        cli.foreign_allocs,
        "allocs freed from non-allocating thread",
        DEFAULT_FOREIGN_ALLOCS,
    )?;

    Ok(WorkloadConfig {
        heap_slots,
        iterations,
        workers,
        foreign_allocs,
        foreign_burst: cli.foreign_burst,
    })
}
