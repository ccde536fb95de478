#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::_rdtsc;

/// Low-overhead timestamp capture for record creation.
///
/// Records stamp themselves once at construction; turning raw ticks into wall
/// clock time is a reader-side concern and stays out of the logging path.

/// Returns a monotonic timestamp with the highest precision available.
///
/// Uses architecture-specific counters when available:
/// - x86_64: RDTSC instruction
/// - aarch64: CNTVCT_EL0 register
/// - other platforms: system time with nanosecond precision
#[inline(always)]
pub fn now() -> u64 {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        _rdtsc()
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        let mut value: u64;
        std::arch::asm!("mrs {}, cntvct_el0", out(reg) value);
        value
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64
    }
}
