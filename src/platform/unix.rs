//! Unix process CPU time via clock_gettime.

use core::ffi::{c_int, c_long};
use std::time::Duration;

#[cfg(any(target_os = "linux", target_os = "android"))]
const CLOCK_PROCESS_CPUTIME_ID: c_int = 2;
#[cfg(any(target_os = "macos", target_os = "ios"))]
const CLOCK_PROCESS_CPUTIME_ID: c_int = 12;
#[cfg(target_os = "freebsd")]
const CLOCK_PROCESS_CPUTIME_ID: c_int = 15;

#[repr(C)]
struct Timespec {
    tv_sec: c_long,
    tv_nsec: c_long,
}

unsafe extern "C" {
    fn clock_gettime(clock_id: c_int, tp: *mut Timespec) -> c_int;
}

pub fn process_cpu_time() -> Option<Duration> {
    let mut ts = Timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec.
    if unsafe { clock_gettime(CLOCK_PROCESS_CPUTIME_ID, &mut ts) } != 0 {
        return None;
    }
    Some(Duration::new(
        u64::try_from(ts.tv_sec).ok()?,
        u32::try_from(ts.tv_nsec).ok()?,
    ))
}
