//! # Cycle Counter
//!
//! A raw, monotonically increasing hardware tick for measuring spin
//! intervals and enforcing caller-side deadlines between retry-loop
//! iterations. Reads `rdtsc` on x86_64, `cntvct_el0` on aarch64 (with the
//! ordering workaround that keeps the read from drifting under
//! speculation), and the `cycle` CSR on riscv64.
//!
//! Not available on the generic backend: no portable tick exists without
//! an OS clock, and this crate takes none.

use crate::arch;

/// Reads the hardware cycle (or fixed-frequency) counter.
///
/// The unit is architecture-defined (TSC ticks, generic-timer ticks, or
/// cycles), so compare readings only against other readings from the same
/// machine. Counter access must be permitted to the current privilege
/// level; on riscv64 in particular, user-mode reads depend on the
/// environment delegating the `cycle` CSR.
#[inline]
pub fn cycles() -> u64 {
    arch::imp::cycles()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    fn test_cycles_advances() {
        // The counter may tick much slower than the core, so poll until
        // it moves rather than assuming one pass is long enough.
        let a = cycles();
        let mut b = a;
        for _ in 0..100_000_000u64 {
            b = cycles();
            if b > a {
                break;
            }
        }
        assert!(b > a);
    }
}
