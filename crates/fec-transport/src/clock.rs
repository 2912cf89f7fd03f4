//! Microsecond timestamps for group stamping and latency measurement.
//!
//! On Linux this reads `CLOCK_MONOTONIC_RAW` (immune to NTP slew); other
//! platforms fall back to `Instant`. The wire format carries group
//! timestamps as 32-bit microseconds, so values are meaningful as
//! differences, not absolutes.

/// Monotonic microsecond timestamp.
#[inline(always)]
pub fn now_us() -> u64 {
    #[cfg(target_os = "linux")]
    {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        unsafe {
            libc::clock_gettime(libc::CLOCK_MONOTONIC_RAW, &mut ts);
        }
        (ts.tv_sec as u64) * 1_000_000 + (ts.tv_nsec as u64) / 1_000
    }
    #[cfg(not(target_os = "linux"))]
    {
        use std::time::Instant;
        static EPOCH: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
        let epoch = EPOCH.get_or_init(Instant::now);
        epoch.elapsed().as_micros() as u64
    }
}

/// The low 32 bits of [`now_us`], the width the wire format carries.
#[inline]
pub fn now_us_wire() -> u32 {
    now_us() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic() {
        let a = now_us();
        let b = now_us();
        assert!(b >= a);
    }
}
