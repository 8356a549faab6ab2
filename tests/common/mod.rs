//! Instrumented allocators shared by the integration tests.

#![allow(dead_code)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

use sh8bench::{Histogram, HistogramEntry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Alloc,
    Free,
}

#[derive(Clone, Copy, Debug)]
pub struct Event {
    pub op: Op,
    pub addr: usize,
    pub size: usize,
    pub align: usize,
    pub thread: ThreadId,
}

/// Forwards to `System` and records every call in order.
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, op: Op, addr: usize, layout: Layout) {
        let event = Event {
            op,
            addr,
            size: layout.size(),
            align: layout.align(),
            thread: thread::current().id(),
        };
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn allocs(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.op == Op::Alloc)
            .collect()
    }

    pub fn frees(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.op == Op::Free)
            .collect()
    }

    /// Replay the log and check every free matches exactly one earlier,
    /// still-live allocation of the same size. Returns `(alloc event, free
    /// event)` pairs in free order; panics on a double or unknown free, or
    /// on a block never freed.
    pub fn pairs(&self) -> Vec<(Event, Event)> {
        let mut live: HashMap<usize, Event> = HashMap::new();
        let mut pairs = Vec::new();
        for e in self.events() {
            match e.op {
                Op::Alloc => {
                    let prev = live.insert(e.addr, e);
                    assert!(prev.is_none(), "address {:#x} handed out twice", e.addr);
                }
                Op::Free => {
                    let a = live
                        .remove(&e.addr)
                        .unwrap_or_else(|| panic!("free of unknown address {:#x}", e.addr));
                    assert_eq!(a.size, e.size, "layout size changed between alloc and free");
                    assert_eq!(a.align, e.align, "layout align changed between alloc and free");
                    pairs.push((a, e));
                }
            }
        }
        assert!(live.is_empty(), "{} blocks leaked", live.len());
        pairs
    }
}

unsafe impl GlobalAlloc for Recorder {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.record(Op::Alloc, ptr as usize, layout);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.record(Op::Free, ptr as usize, layout);
        unsafe { System.dealloc(ptr, layout) };
    }
}

/// Forwards to `System` for the first `budget` allocations, then fails.
pub struct FailAfter {
    budget: AtomicUsize,
    live: AtomicUsize,
}

impl FailAfter {
    pub const fn new(budget: usize) -> Self {
        Self {
            budget: AtomicUsize::new(budget),
            live: AtomicUsize::new(0),
        }
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

unsafe impl GlobalAlloc for FailAfter {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let granted = self
            .budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !granted {
            return std::ptr::null_mut();
        }
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.live.fetch_add(1, Ordering::SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        unsafe { System.dealloc(ptr, layout) };
    }
}

/// Build a histogram from `(size, count)` pairs.
pub fn histogram(buckets: &[(usize, usize)]) -> Histogram {
    Histogram::new(
        buckets
            .iter()
            .map(|&(size, count)| HistogramEntry { size, count })
            .collect(),
    )
    .unwrap()
}
