//! Per-worker circular buffer of live blocks.
//!
//! The buffer bounds a worker's working set to `capacity` blocks while
//! mixing short- and long-lived allocations. A cursor walks the buffer filling
//! empty slots. A protected window of `capacity / 5` slots keeps the blocks
//! from the previous fill cycle alive and is skipped while filling. When the
//! cursor runs off the end, a retire event:
//!
//! 1. moves the window to start where the old one ended (wrapping to 0),
//! 2. frees every slot below the window in allocation order,
//! 3. frees every slot above the window in reverse allocation order,
//! 4. rewinds the cursor.
//!
//! ```text
//!   0        start      end                capacity
//!   |--------|==========|-------------------|
//!    freed ->  protected   <- freed
//! ```
//!
//! The request that triggers a retire event does not allocate.

use core::alloc::GlobalAlloc;
use core::ops::Range;

use crate::block::Block;
use crate::error::{Error, Result};
use crate::{stat_add, stat_inc};

/// Outcome of one [`LiveSlots::allocate`] request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A block was stored at the cursor.
    Allocated,
    /// The cursor reached the end; the buffer was retired instead.
    Retired,
}

pub struct LiveSlots<'a, A: GlobalAlloc + ?Sized> {
    alloc: &'a A,
    slots: Box<[Option<Block>]>,
    cursor: usize,
    window_start: usize,
    window_end: usize,
    allocated: u64,
    freed: u64,
    retires: u64,
}

impl<'a, A: GlobalAlloc + ?Sized> LiveSlots<'a, A> {
    /// Create an empty buffer of `capacity` slots.
    ///
    /// The slot array itself is reserved fallibly so an oversized heap is
    /// reported instead of aborting.
    pub fn new(alloc: &'a A, capacity: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|source| Error::Setup {
                what: "live slot buffer",
                source,
            })?;
        slots.resize_with(capacity, || None);
        Ok(Self {
            alloc,
            slots: slots.into_boxed_slice(),
            cursor: 0,
            window_start: capacity,
            window_end: capacity,
            allocated: 0,
            freed: 0,
            retires: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Slots currently protected from reuse.
    pub fn window(&self) -> Range<usize> {
        self.window_start..self.window_end
    }

    /// Number of occupied slots.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Address of the block in slot `index`, if any.
    pub fn slot_addr(&self, index: usize) -> Option<usize> {
        self.slots.get(index)?.as_ref().map(Block::addr)
    }

    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn freed(&self) -> u64 {
        self.freed
    }

    pub fn retires(&self) -> u64 {
        self.retires
    }

    /// Serve one request for `size` bytes.
    ///
    /// Returns [`Error::OutOfMemory`] if the allocator fails; the buffer is
    /// left consistent but the caller is expected to abandon the run.
    pub fn allocate(&mut self, size: usize) -> Result<Step> {
        if self.cursor == self.window_start {
            self.cursor = self.window_end;
        }

        if self.cursor >= self.capacity() {
            self.retire();
            return Ok(Step::Retired);
        }

        let alloc = self.alloc;
        let slot = &mut self.slots[self.cursor];
        if let Some(stale) = slot.take() {
            // SAFETY: every block in this buffer came from `alloc`.
            unsafe { stale.release(alloc) };
            self.freed += 1;
            stat_inc!(frees);
        }

        let block = Block::alloc(alloc, size).ok_or(Error::OutOfMemory { size })?;
        *slot = Some(block);
        self.cursor += 1;
        self.allocated += 1;
        stat_inc!(allocs);
        stat_add!(alloc_bytes, size);
        Ok(Step::Allocated)
    }

    fn retire(&mut self) {
        let capacity = self.capacity();

        self.window_start = if self.window_end >= capacity {
            0
        } else {
            self.window_end
        };
        self.window_end = (self.window_start + capacity / 5).min(capacity);

        let alloc = self.alloc;
        let mut freed = 0;
        for slot in &mut self.slots[..self.window_start] {
            if let Some(block) = slot.take() {
                // SAFETY: every block in this buffer came from `alloc`.
                unsafe { block.release(alloc) };
                freed += 1;
            }
        }
        for slot in self.slots[self.window_end..].iter_mut().rev() {
            if let Some(block) = slot.take() {
                // SAFETY: as above.
                unsafe { block.release(alloc) };
                freed += 1;
            }
        }

        self.cursor = 0;
        self.freed += freed;
        self.retires += 1;
        stat_add!(frees, freed);
        stat_inc!(retires);
    }

    /// Free every remaining block in ascending slot order and reset the
    /// cursor and window. Returns the number of blocks freed.
    pub fn release_all(&mut self) -> u64 {
        let alloc = self.alloc;
        let mut freed = 0;
        for slot in self.slots.iter_mut() {
            if let Some(block) = slot.take() {
                // SAFETY: every block in this buffer came from `alloc`.
                unsafe { block.release(alloc) };
                freed += 1;
            }
        }
        let capacity = self.capacity();
        self.cursor = 0;
        self.window_start = capacity;
        self.window_end = capacity;
        self.freed += freed;
        stat_add!(frees, freed);
        freed
    }
}

impl<A: GlobalAlloc + ?Sized> Drop for LiveSlots<'_, A> {
    fn drop(&mut self) {
        self.release_all();
    }
}
