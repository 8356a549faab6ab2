//! Windows process CPU time via GetProcessTimes.

use core::ffi::c_void;
use std::time::Duration;

#[repr(C)]
#[derive(Default)]
struct FileTime {
    low: u32,
    high: u32,
}

impl FileTime {
    /// FILETIME counts 100 ns ticks.
    fn to_duration(&self) -> Duration {
        let ticks = (u64::from(self.high) << 32) | u64::from(self.low);
        Duration::from_nanos(ticks.saturating_mul(100))
    }
}

unsafe extern "system" {
    #[link_name = "GetCurrentProcess"]
    fn get_current_process() -> *mut c_void;

    #[link_name = "GetProcessTimes"]
    fn get_process_times(
        process: *mut c_void,
        creation: *mut FileTime,
        exit: *mut FileTime,
        kernel: *mut FileTime,
        user: *mut FileTime,
    ) -> i32;
}

pub fn process_cpu_time() -> Option<Duration> {
    let mut creation = FileTime::default();
    let mut exit = FileTime::default();
    let mut kernel = FileTime::default();
    let mut user = FileTime::default();
    // SAFETY: the pseudo-handle is always valid; all out-pointers are writable.
    let ok = unsafe {
        get_process_times(
            get_current_process(),
            &mut creation,
            &mut exit,
            &mut kernel,
            &mut user,
        )
    };
    if ok == 0 {
        return None;
    }
    Some(kernel.to_duration() + user.to_duration())
}
