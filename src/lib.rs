//! sh8bench: a reproducible allocator stress workload.
//!
//! Drives any [`GlobalAlloc`](core::alloc::GlobalAlloc) with a deterministic
//! mix of block sizes and lifetimes, optionally across threads that free
//! blocks allocated elsewhere. Three pieces do the work:
//! - a size histogram walked round-robin ([`histogram`]),
//! - a bounded circular buffer of live blocks per worker, retired in two
//!   release orders ([`slots`]),
//! - a pre-populated pool of blocks split so every worker frees a share of
//!   every producer segment ([`foreign`]).
//!
//! # Usage
//!
//! ```no_run
//! use std::alloc::System;
//! use sh8bench::{Histogram, WorkloadConfig, harness};
//!
//! let config = WorkloadConfig {
//!     heap_slots: 100_000,
//!     iterations: 10_000,
//!     workers: 4,
//!     foreign_allocs: 160_000,
//!     foreign_burst: None,
//! };
//! let report = harness::run(&System, config, &Histogram::default()).unwrap();
//! println!("{report}");
//! ```

pub mod block;
pub mod config;
pub mod error;
pub mod foreign;
pub mod harness;
pub mod histogram;
mod macros;
pub mod platform;
pub mod prompt;
pub mod report;
pub mod slots;
#[cfg(feature = "stats")]
pub mod stats;
pub mod worker;

pub use block::BLOCK_ALIGN;
pub use config::{WorkerPlan, WorkloadConfig};
pub use error::{Error, Result};
pub use harness::{Harness, OnFailure};
pub use histogram::{Histogram, HistogramEntry};
pub use report::RunReport;
pub use worker::{Worker, WorkerReport};
