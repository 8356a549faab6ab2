//! Owned handles to blocks obtained from the allocator under test.
//!
//! A [`Block`] remembers the layout it was created with so it can be handed
//! back through `GlobalAlloc::dealloc`. It is only ever released through the
//! allocator that produced it; the structures owning blocks (`LiveSlots`,
//! `ForeignPool`) each hold exactly one allocator reference.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;

/// Alignment of every workload request.
pub const BLOCK_ALIGN: usize = 8;

pub(crate) struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

// SAFETY: a Block is the sole owner of its allocation, like a `Box<[u8]>`.
// The allocators under test are required to accept frees from any thread.
unsafe impl Send for Block {}

impl Block {
    /// Request `size` bytes. Returns `None` when the allocator fails.
    #[inline]
    pub(crate) fn alloc<A: GlobalAlloc + ?Sized>(alloc: &A, size: usize) -> Option<Self> {
        let layout = Layout::from_size_align(size.max(1), BLOCK_ALIGN).ok()?;
        Self::alloc_layout(alloc, layout)
    }

    #[inline]
    pub(crate) fn alloc_layout<A: GlobalAlloc + ?Sized>(alloc: &A, layout: Layout) -> Option<Self> {
        debug_assert!(layout.size() > 0);
        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc.alloc(layout) };
        NonNull::new(ptr).map(|ptr| Self { ptr, layout })
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Hand the block back to the allocator.
    ///
    /// # Safety
    /// `alloc` must be the allocator this block was obtained from.
    #[inline]
    pub(crate) unsafe fn release<A: GlobalAlloc + ?Sized>(self, alloc: &A) {
        unsafe { alloc.dealloc(self.ptr.as_ptr(), self.layout) };
    }
}
