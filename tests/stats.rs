//! Integration tests for the stats feature.
//!
//! Run with: cargo test --features stats --test stats

#![cfg(feature = "stats")]

mod common;

use std::alloc::System;

use common::histogram;
use sh8bench::stats;
use sh8bench::{Harness, WorkloadConfig};

#[test]
fn test_counters_track_a_run() {
    let before = stats::snapshot();
    let config = WorkloadConfig {
        heap_slots: 40,
        iterations: 20,
        workers: 2,
        foreign_allocs: 12,
        foreign_burst: None,
    };
    let report = Harness::new(&System, config, &histogram(&[(8, 3), (32, 1)]))
        .run()
        .unwrap();
    let after = stats::snapshot();

    let t = report.totals();
    assert_eq!(after.allocs - before.allocs, t.allocations);
    assert_eq!(after.frees - before.frees, t.frees);
    assert_eq!(after.retires - before.retires, t.retires);
    assert_eq!(after.foreign_allocs - before.foreign_allocs, 12);
    assert_eq!(after.foreign_frees - before.foreign_frees, 12);
    assert!(after.alloc_bytes > before.alloc_bytes);
    assert!(after.to_string().contains("foreign frees"));
}
