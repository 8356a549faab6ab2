//! Cross-thread free distribution.
//!
//! The foreign pool holds `total` tagged blocks, all allocated by the
//! orchestrating thread before any worker starts. The pool is split into
//! `workers` producer segments of `quota = total / workers` slots, and each
//! segment into `workers` chunks of `chunk = quota / workers` slots:
//!
//! ```text
//!   segment 0                 segment 1
//!   | w0 chunk | w1 chunk |   | w0 chunk | w1 chunk |   ...
//! ```
//!
//! Worker `w` owns chunk `w` of every segment. Its [`ForeignInbox`] frees a
//! whole chunk before moving to the same chunk of the next segment, so each
//! worker drains a fair share of every producer instead of exhausting one.
//!
//! The chunks are handed out as disjoint `&mut` slices, so no slot is ever
//! visible to two workers and the pool needs no lock or atomic of its own.
//! All contention lands on the allocator under test.
//!
//! Each block starts with a [`ForeignTag`] naming the slot it was stored in.
//! A worker checks the tag before freeing; a mismatch means the harness or
//! the allocator corrupted memory, and the block is not freed.

use core::alloc::{GlobalAlloc, Layout};
use core::mem::{align_of, size_of};

use tracing::{debug, error};

use crate::block::{BLOCK_ALIGN, Block};
use crate::config::WorkerPlan;
use crate::error::{Error, Result};
use crate::stat_inc;

/// Header written at the start of every foreign block.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ForeignTag {
    slot: usize,
}

/// A block whose first word is a [`ForeignTag`].
pub(crate) struct TaggedBlock {
    block: Block,
}

impl TaggedBlock {
    fn layout(size: usize) -> Option<Layout> {
        Layout::from_size_align(
            size.max(size_of::<ForeignTag>()),
            align_of::<ForeignTag>().max(BLOCK_ALIGN),
        )
        .ok()
    }

    fn new<A: GlobalAlloc + ?Sized>(alloc: &A, size: usize, slot: usize) -> Option<Self> {
        let block = Block::alloc_layout(alloc, Self::layout(size)?)?;
        // SAFETY: the layout is at least as large and aligned as a ForeignTag.
        unsafe { block.as_ptr().cast::<ForeignTag>().write(ForeignTag { slot }) };
        Some(Self { block })
    }

    #[inline]
    fn tag(&self) -> usize {
        // SAFETY: written in `new`; the block is exclusively owned.
        unsafe { self.block.as_ptr().cast::<ForeignTag>().read().slot }
    }

    #[cfg(test)]
    fn retag(&mut self, slot: usize) {
        unsafe {
            self.block
                .as_ptr()
                .cast::<ForeignTag>()
                .write(ForeignTag { slot })
        };
    }
}

/// The shared pool of blocks destined to be freed by a worker thread.
pub struct ForeignPool<'a, A: GlobalAlloc + ?Sized> {
    alloc: &'a A,
    slots: Box<[Option<TaggedBlock>]>,
    workers: usize,
    chunk: usize,
}

impl<'a, A: GlobalAlloc + ?Sized> ForeignPool<'a, A> {
    /// Allocate and tag every slot of the pool described by `plan`.
    ///
    /// Every block is `block_size` bytes (rounded up to hold the tag).
    pub fn populate(alloc: &'a A, plan: &WorkerPlan, block_size: usize) -> Result<Self> {
        let total = plan.foreign_total;
        let mut slots: Vec<Option<TaggedBlock>> = Vec::new();
        slots
            .try_reserve_exact(total)
            .map_err(|source| Error::Setup {
                what: "foreign allocation pool",
                source,
            })?;

        for slot in 0..total {
            let Some(block) = TaggedBlock::new(alloc, block_size, slot) else {
                // Hand back what was filled before failing.
                for filled in slots.into_iter().flatten() {
                    // SAFETY: every block pushed above came from `alloc`.
                    unsafe { filled.block.release(alloc) };
                }
                return Err(Error::OutOfMemory { size: block_size });
            };
            slots.push(Some(block));
            stat_inc!(foreign_allocs);
        }

        debug!(
            total,
            block_size,
            quota = plan.foreign_quota,
            chunk = plan.foreign_chunk,
            "foreign pool populated"
        );

        Ok(Self {
            alloc,
            slots: slots.into_boxed_slice(),
            workers: plan.workers,
            chunk: plan.foreign_chunk,
        })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots still holding a block.
    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Split the pool into one inbox per worker, indexed by worker id.
    pub fn inboxes(&mut self) -> Vec<ForeignInbox<'_, A>> {
        let alloc = self.alloc;
        let workers = self.workers;
        let mut inboxes: Vec<ForeignInbox<'_, A>> = (0..workers)
            .map(|worker| ForeignInbox {
                alloc,
                worker,
                chunks: Vec::with_capacity(workers),
                chunk: 0,
                offset: 0,
                remaining: 0,
            })
            .collect();

        if self.chunk == 0 || workers == 0 {
            return inboxes;
        }

        for (i, chunk) in self.slots.chunks_mut(self.chunk).enumerate() {
            let inbox = &mut inboxes[i % workers];
            inbox.remaining += chunk.len();
            inbox.chunks.push(Chunk {
                base: i * self.chunk,
                slots: chunk,
            });
        }
        inboxes
    }
}

impl<A: GlobalAlloc + ?Sized> Drop for ForeignPool<'_, A> {
    fn drop(&mut self) {
        let alloc = self.alloc;
        let mut leftover = 0usize;
        for block in self.slots.iter_mut().filter_map(Option::take) {
            // SAFETY: every block in the pool came from `alloc`.
            unsafe { block.block.release(alloc) };
            leftover += 1;
        }
        if leftover > 0 {
            debug!(leftover, "released undrained foreign blocks");
        }
    }
}

struct Chunk<'p> {
    base: usize,
    slots: &'p mut [Option<TaggedBlock>],
}

/// One worker's exclusive view of the foreign pool.
pub struct ForeignInbox<'p, A: GlobalAlloc + ?Sized> {
    alloc: &'p A,
    worker: usize,
    chunks: Vec<Chunk<'p>>,
    chunk: usize,
    offset: usize,
    remaining: usize,
}

impl<A: GlobalAlloc + ?Sized> ForeignInbox<'_, A> {
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Blocks this worker has yet to free.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Pool slot indices this inbox drains, in drain order.
    pub fn slot_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.chunks
            .iter()
            .flat_map(|c| c.base..c.base + c.slots.len())
    }

    /// Free pending blocks in order until `limit` blocks were freed, the
    /// quota is exhausted, or an empty slot is reached. `None` drains without
    /// a per-call cap. Returns the number freed by this call.
    pub fn drain(&mut self, limit: Option<usize>) -> Result<u64> {
        let mut freed = 0u64;
        let limit = limit.map_or(u64::MAX, |l| l as u64);

        while self.remaining > 0 && freed < limit {
            let chunk = &mut self.chunks[self.chunk];
            let slot = chunk.base + self.offset;
            let Some(block) = chunk.slots[self.offset].take() else {
                break;
            };

            let found = block.tag();
            if found != slot {
                error!(
                    worker = self.worker,
                    slot, found, "foreign block tag does not match its slot"
                );
                debug_assert_eq!(found, slot, "foreign block tag mismatch");
                // The block's bookkeeping is untrusted; leak it.
                return Err(Error::CorruptTag { slot, found });
            }

            // SAFETY: every block in the pool came from `alloc`.
            unsafe { block.block.release(self.alloc) };
            stat_inc!(foreign_frees);
            freed += 1;
            self.remaining -= 1;

            self.offset += 1;
            if self.offset == chunk.slots.len() {
                self.chunk += 1;
                self.offset = 0;
            }
        }
        Ok(freed)
    }
}
