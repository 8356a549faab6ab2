//! Block size histogram.
//!
//! An ordered table of `(size, count)` buckets. A worker walks the table
//! round-robin, performing `count` allocations of `size` bytes per bucket.
//! The walk is deterministic, so two runs with the same table issue the same
//! sequence of request sizes regardless of the allocator under test.
//!
//! The default table is generated by `build.rs` from `sh8bench.toml`; other
//! tables can be loaded at runtime from a file using the same schema:
//!
//! ```toml
//! [[bucket]]
//! size = 8
//! count = 1000
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// One bucket: `count` consecutive allocations of `size` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct HistogramEntry {
    pub size: usize,
    pub count: usize,
}

include!(concat!(env!("OUT_DIR"), "/histogram_gen.rs"));

#[derive(Deserialize)]
struct HistogramFile {
    #[serde(default)]
    bucket: Vec<HistogramEntry>,
}

/// A validated, immutable histogram: at least one bucket, every size ≥ 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    entries: Vec<HistogramEntry>,
}

impl Histogram {
    pub fn new(entries: Vec<HistogramEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::EmptyHistogram);
        }
        if let Some(index) = entries.iter().position(|e| e.size == 0) {
            return Err(Error::ZeroBlockSize { index });
        }
        Ok(Self { entries })
    }

    /// Parse a `[[bucket]]` table list.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: HistogramFile = toml::from_str(content)?;
        Self::new(file.bucket)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    /// Size of the first bucket. Every foreign block uses this size so that
    /// cross-thread frees collide on the same size class.
    pub fn first_size(&self) -> usize {
        self.entries[0].size
    }

    /// Number of allocation requests in one full pass over the table.
    pub fn requests_per_cycle(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// A cursor positioned at the first bucket.
    pub fn cursor(&self) -> SizeCursor<'_> {
        SizeCursor {
            entries: &self.entries,
            index: 0,
        }
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            entries: DEFAULT_HISTOGRAM.to_vec(),
        }
    }
}

/// Round-robin walk over a histogram. Never ends; wraps to the first bucket
/// after the last.
#[derive(Clone, Debug)]
pub struct SizeCursor<'h> {
    entries: &'h [HistogramEntry],
    index: usize,
}

impl SizeCursor<'_> {
    /// Index of the bucket the next call to `next` returns.
    pub fn position(&self) -> usize {
        self.index
    }
}

impl Iterator for SizeCursor<'_> {
    type Item = HistogramEntry;

    #[inline]
    fn next(&mut self) -> Option<HistogramEntry> {
        let entry = *self.entries.get(self.index)?;
        self.index += 1;
        if self.index == self.entries.len() {
            self.index = 0;
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_matches_config() {
        let h = Histogram::default();
        assert_eq!(h.entries().len(), DEFAULT_HISTOGRAM.len());
        assert!(h.entries().iter().all(|e| e.size > 0));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(Histogram::new(Vec::new()), Err(Error::EmptyHistogram)));
    }

    #[test]
    fn test_rejects_zero_size() {
        let entries = vec![
            HistogramEntry { size: 8, count: 1 },
            HistogramEntry { size: 0, count: 1 },
        ];
        assert!(matches!(
            Histogram::new(entries),
            Err(Error::ZeroBlockSize { index: 1 })
        ));
    }

    #[test]
    fn test_zero_count_bucket_is_allowed() {
        let h = Histogram::new(vec![HistogramEntry { size: 8, count: 0 }]).unwrap();
        assert_eq!(h.requests_per_cycle(), 0);
    }

    #[test]
    fn test_parse_toml() {
        let h = Histogram::from_toml(
            "[[bucket]]\nsize = 8\ncount = 2\n\n[[bucket]]\nsize = 16\ncount = 1\n",
        )
        .unwrap();
        assert_eq!(
            h.entries(),
            &[
                HistogramEntry { size: 8, count: 2 },
                HistogramEntry { size: 16, count: 1 },
            ]
        );
        assert_eq!(h.first_size(), 8);
        assert_eq!(h.requests_per_cycle(), 3);
    }

    #[test]
    fn test_parse_toml_without_buckets() {
        assert!(matches!(
            Histogram::from_toml(""),
            Err(Error::EmptyHistogram)
        ));
    }

    #[test]
    fn test_parse_toml_malformed() {
        assert!(matches!(
            Histogram::from_toml("[[bucket]]\nsize = \"big\"\n"),
            Err(Error::HistogramParse(_))
        ));
    }

    #[test]
    fn test_cursor_wraps() {
        let h = Histogram::new(vec![
            HistogramEntry { size: 1, count: 1 },
            HistogramEntry { size: 2, count: 1 },
        ])
        .unwrap();
        let mut c = h.cursor();
        assert_eq!(c.position(), 0);
        assert_eq!(c.next().map(|e| e.size), Some(1));
        assert_eq!(c.position(), 1);
        assert_eq!(c.next().map(|e| e.size), Some(2));
        assert_eq!(c.position(), 0);
        assert_eq!(c.next().map(|e| e.size), Some(1));
    }
}
