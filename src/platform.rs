//! OS shims used by the harness.
//!
//! Process CPU time comes from `clock_gettime(CLOCK_PROCESS_CPUTIME_ID)` on
//! Unix and `GetProcessTimes` on Windows. Elsewhere it is unavailable and
//! reported as `None`.

use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

cfg_if::cfg_if! {
    if #[cfg(any(
        target_os = "linux",
        target_os = "android",
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd",
    ))] {
        mod unix;
    } else if #[cfg(windows)] {
        mod windows;
    }
}

/// CPU time consumed by all threads of this process so far.
pub fn process_cpu_time() -> Option<Duration> {
    cfg_if::cfg_if! {
        if #[cfg(any(
            target_os = "linux",
            target_os = "android",
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
        ))] {
            unix::process_cpu_time()
        } else if #[cfg(windows)] {
            windows::process_cpu_time()
        } else {
            None
        }
    }
}

/// Number of workers the machine can run in parallel, at least 1.
pub fn available_parallelism() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
