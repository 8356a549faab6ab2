/// Bump one of the workload counters in `stats` by one, e.g.
/// `stat_inc!(retires)` after a buffer retire event.
///
/// Without the `stats` feature the call site expands to nothing.
#[macro_export]
macro_rules! stat_inc {
    ($counter:ident) => {
        $crate::stat_add!($counter, 1u64)
    };
}

/// Add a block count or byte total to a counter, as in
/// `stat_add!(alloc_bytes, size)` after a live-slot allocation.
///
/// Without the `stats` feature neither the counter nor `$val` is evaluated.
#[macro_export]
macro_rules! stat_add {
    ($counter:ident, $val:expr) => {
        #[cfg(feature = "stats")]
        {
            $crate::stats::STATS
                .$counter
                .fetch_add($val as u64, ::core::sync::atomic::Ordering::Relaxed);
        }
    };
}
