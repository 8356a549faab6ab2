//! Histogram files and the round-robin size walk.

mod common;

use std::alloc::System;
use std::fs;
use std::path::PathBuf;

use common::{Recorder, histogram};
use sh8bench::{Error, Harness, Histogram, HistogramEntry, OnFailure, WorkloadConfig};

struct TempFile(PathBuf);

impl TempFile {
    fn new(name: &str, content: &str) -> Self {
        let path = std::env::temp_dir().join(format!("sh8bench-{}-{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        Self(path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.0);
    }
}

#[test]
fn test_cursor_cycles() {
    let h = histogram(&[(8, 1), (16, 2), (48, 3)]);
    let n = h.entries().len();

    let first: Vec<HistogramEntry> = h.cursor().take(n).collect();
    assert_eq!(first, h.entries());

    let mut cursor = h.cursor();
    let wrapped = cursor.nth(n).unwrap();
    assert_eq!(wrapped, h.entries()[0]);
    assert_eq!(cursor.position(), 1);
}

#[test]
fn test_load_from_file() {
    let file = TempFile::new(
        "load.toml",
        r#"
[[bucket]]
size = 24
count = 3

[[bucket]]
size = 4096
count = 1
"#,
    );
    let h = Histogram::load(&file.0).unwrap();
    assert_eq!(h.first_size(), 24);
    assert_eq!(h.requests_per_cycle(), 4);

    let rec = Recorder::new();
    Harness::new(&rec, WorkloadConfig::single_threaded(16, 4), &h)
        .on_failure(OnFailure::Report)
        .run()
        .unwrap();
    let sizes: Vec<usize> = rec.allocs().iter().map(|e| e.size).collect();
    assert_eq!(sizes, vec![24, 24, 24, 4096, 24, 24, 24, 4096]);
}

#[test]
fn test_load_missing_file() {
    let path = std::env::temp_dir().join("sh8bench-does-not-exist.toml");
    assert!(matches!(Histogram::load(path), Err(Error::Io(_))));
}

#[test]
fn test_load_rejects_zero_size() {
    let file = TempFile::new("zero.toml", "[[bucket]]\nsize = 0\ncount = 5\n");
    assert!(matches!(
        Histogram::load(&file.0),
        Err(Error::ZeroBlockSize { index: 0 })
    ));
}

#[test]
fn test_default_table_runs() {
    let h = Histogram::default();
    assert!(h.requests_per_cycle() > 0);
    let report = Harness::new(&System, WorkloadConfig::single_threaded(1_000, 24), &h)
        .run()
        .unwrap();
    assert_eq!(report.workers[0].allocations, report.workers[0].frees);
}
