//! # AArch64 Backend
//!
//! AArch64 is weakly ordered, so every contract here maps to a specific
//! ordering-qualified instruction. Two interchangeable sub-paths cover the
//! read-modify-write operations and are chosen at build time by
//! `target_feature = "lse"` (Large System Extensions, enabled with
//! `-C target-feature=+lse` or a `target-cpu` that implies it):
//!
//! | Operation             | LL/SC sub-path               | LSE sub-path |
//! |-----------------------|------------------------------|--------------|
//! | CAS acquire           | `ldaxr` / `stxr` loop        | `casa`       |
//! | CAS release           | `ldxr` / `stlxr` loop        | `casl`       |
//! | CAS relaxed           | `ldxr` / `stxr` loop         | `cas`        |
//! | fetch-or acquire      | `ldaxr` / `orr` / `stlxr`    | `ldseta`     |
//! | 16-bit exchange rel.  | `ldxrh` / `stlxrh` loop      | `swplh`      |
//!
//! Both sub-paths produce identical observable semantics.
//! Ordered loads and stores are always `ldar*`/`stlr*`,
//! and the spin-wait hint always uses the exclusive monitor: an `ldxr` of
//! the watched location arms it, and `wfe` then sleeps until another agent
//! writes the line or an unrelated event fires. Spurious wakeups are fine,
//! the caller re-reads.

use core::arch::asm;
use core::sync::atomic::{AtomicU8, AtomicU16, AtomicU32, AtomicU64};

// ============================================================================
// Compare-and-Swap
// ============================================================================

/// 32-bit compare-and-swap, acquire-ordered.
#[cfg(target_feature = "lse")]
#[inline]
pub(crate) fn cmpxchg32_acquire(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "casa {prev:w}, {new:w}, [{ptr}]",
            prev = inout(reg) expected => prev,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

/// 32-bit compare-and-swap, acquire-ordered.
///
/// The exclusive load carries the acquire; the store is plain. `eor`/`cbnz`
/// does the comparison without touching the condition flags.
#[cfg(not(target_feature = "lse"))]
#[inline]
pub(crate) fn cmpxchg32_acquire(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "1:",
            "ldaxr {prev:w}, [{ptr}]",
            "eor {status:w}, {prev:w}, {expected:w}",
            "cbnz {status:w}, 2f",
            "stxr {status:w}, {new:w}, [{ptr}]",
            "cbnz {status:w}, 1b",
            "2:",
            prev = out(reg) prev,
            status = out(reg) _,
            expected = in(reg) expected,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

/// 32-bit compare-and-swap, release-ordered.
#[cfg(target_feature = "lse")]
#[inline]
pub(crate) fn cmpxchg32_release(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "casl {prev:w}, {new:w}, [{ptr}]",
            prev = inout(reg) expected => prev,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

/// 32-bit compare-and-swap, release-ordered.
///
/// The exclusive store carries the release; the load is plain.
#[cfg(not(target_feature = "lse"))]
#[inline]
pub(crate) fn cmpxchg32_release(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "1:",
            "ldxr {prev:w}, [{ptr}]",
            "eor {status:w}, {prev:w}, {expected:w}",
            "cbnz {status:w}, 2f",
            "stlxr {status:w}, {new:w}, [{ptr}]",
            "cbnz {status:w}, 1b",
            "2:",
            prev = out(reg) prev,
            status = out(reg) _,
            expected = in(reg) expected,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

/// 32-bit compare-and-swap, relaxed.
#[cfg(target_feature = "lse")]
#[inline]
pub(crate) fn cmpxchg32_relaxed(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "cas {prev:w}, {new:w}, [{ptr}]",
            prev = inout(reg) expected => prev,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

/// 32-bit compare-and-swap, relaxed. Atomicity only, no ordering.
#[cfg(not(target_feature = "lse"))]
#[inline]
pub(crate) fn cmpxchg32_relaxed(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "1:",
            "ldxr {prev:w}, [{ptr}]",
            "eor {status:w}, {prev:w}, {expected:w}",
            "cbnz {status:w}, 2f",
            "stxr {status:w}, {new:w}, [{ptr}]",
            "cbnz {status:w}, 1b",
            "2:",
            prev = out(reg) prev,
            status = out(reg) _,
            expected = in(reg) expected,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

// ============================================================================
// Fetch-Or / Exchange
// ============================================================================

/// Atomic `word |= mask`, acquire-ordered, returning the prior value
/// (`ldseta`: one ordered read-modify-write, no loop).
#[cfg(target_feature = "lse")]
#[inline]
pub(crate) fn fetch_or32_acquire(word: &AtomicU32, mask: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "ldseta {mask:w}, {prev:w}, [{ptr}]",
            mask = in(reg) mask,
            prev = out(reg) prev,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

/// Atomic `word |= mask`, acquire-ordered, returning the prior value.
///
/// The line is prefetched in streaming-store mode before the exclusive pair
/// to shorten the window in which the reservation can be stolen.
#[cfg(not(target_feature = "lse"))]
#[inline]
pub(crate) fn fetch_or32_acquire(word: &AtomicU32, mask: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "prfm pstl1strm, [{ptr}]",
            "1:",
            "ldaxr {prev:w}, [{ptr}]",
            "orr {newval:w}, {prev:w}, {mask:w}",
            "stlxr {status:w}, {newval:w}, [{ptr}]",
            "cbnz {status:w}, 1b",
            prev = out(reg) prev,
            newval = out(reg) _,
            status = out(reg) _,
            mask = in(reg) mask,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

/// Atomic 16-bit exchange, release-ordered, returning the prior value
/// (`swplh`: release swap on a halfword).
#[cfg(target_feature = "lse")]
#[inline]
pub(crate) fn xchg16_release(word: &AtomicU16, val: u16) -> u16 {
    let prev: u16;
    unsafe {
        asm!(
            "swplh {val:w}, {prev:w}, [{ptr}]",
            val = in(reg) val,
            prev = out(reg) prev,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

/// Atomic 16-bit exchange, release-ordered, returning the prior value.
#[cfg(not(target_feature = "lse"))]
#[inline]
pub(crate) fn xchg16_release(word: &AtomicU16, val: u16) -> u16 {
    let prev: u16;
    unsafe {
        asm!(
            "1:",
            "ldxrh {prev:w}, [{ptr}]",
            "stlxrh {status:w}, {val:w}, [{ptr}]",
            "cbnz {status:w}, 1b",
            prev = out(reg) prev,
            status = out(reg) _,
            val = in(reg) val,
            ptr = in(reg) word.as_ptr(),
            options(nostack, preserves_flags),
        );
    }
    prev
}

// ============================================================================
// Ordered Loads and Stores
// ============================================================================

macro_rules! load_acquire {
    ($(#[$doc:meta])* $name:ident, $atomic:ty, $val:ty, $insn:literal) => {
        $(#[$doc])*
        #[inline]
        pub(crate) fn $name(word: &$atomic) -> $val {
            let value: $val;
            unsafe {
                asm!(
                    $insn,
                    value = out(reg) value,
                    ptr = in(reg) word.as_ptr(),
                    options(nostack, preserves_flags),
                );
            }
            value
        }
    };
}

macro_rules! store_release {
    ($(#[$doc:meta])* $name:ident, $atomic:ty, $val:ty, $insn:literal) => {
        $(#[$doc])*
        #[inline]
        pub(crate) fn $name(word: &$atomic, val: $val) {
            unsafe {
                asm!(
                    $insn,
                    val = in(reg) val,
                    ptr = in(reg) word.as_ptr(),
                    options(nostack, preserves_flags),
                );
            }
        }
    };
}

load_acquire!(
    /// Acquire load, 8-bit (`ldarb`).
    load_acquire_u8, AtomicU8, u8, "ldarb {value:w}, [{ptr}]"
);
load_acquire!(
    /// Acquire load, 16-bit (`ldarh`).
    load_acquire_u16, AtomicU16, u16, "ldarh {value:w}, [{ptr}]"
);
load_acquire!(
    /// Acquire load, 32-bit (`ldar`).
    load_acquire_u32, AtomicU32, u32, "ldar {value:w}, [{ptr}]"
);
load_acquire!(
    /// Acquire load, 64-bit (`ldar`).
    load_acquire_u64, AtomicU64, u64, "ldar {value}, [{ptr}]"
);

store_release!(
    /// Release store, 8-bit (`stlrb`).
    store_release_u8, AtomicU8, u8, "stlrb {val:w}, [{ptr}]"
);
store_release!(
    /// Release store, 16-bit (`stlrh`).
    store_release_u16, AtomicU16, u16, "stlrh {val:w}, [{ptr}]"
);
store_release!(
    /// Release store, 32-bit (`stlr`).
    store_release_u32, AtomicU32, u32, "stlr {val:w}, [{ptr}]"
);
store_release!(
    /// Release store, 64-bit (`stlr`).
    store_release_u64, AtomicU64, u64, "stlr {val}, [{ptr}]"
);

// ============================================================================
// Event-Wait Hint
// ============================================================================

// The exclusive load arms the monitor on the watched line; `wfe` then only
// sleeps if the value still equals what the caller last saw. A write by any
// other core clears the monitor and ends the wait. Widening to 64 bits for
// the comparison is free: the exclusive loads zero-extend.

macro_rules! wait_until_changed {
    ($(#[$doc:meta])* $name:ident, $atomic:ty, $val:ty, $ldxr:literal) => {
        $(#[$doc])*
        #[inline]
        pub(crate) fn $name(word: &$atomic, observed: $val) {
            unsafe {
                asm!(
                    $ldxr,
                    "eor {tmp}, {tmp}, {observed}",
                    "cbnz {tmp}, 1f",
                    "wfe",
                    "1:",
                    tmp = out(reg) _,
                    observed = in(reg) u64::from(observed),
                    ptr = in(reg) word.as_ptr(),
                    options(nostack, preserves_flags),
                );
            }
        }
    };
}

wait_until_changed!(
    /// Monitor-armed wait on an 8-bit location.
    wait_until_changed_u8, AtomicU8, u8, "ldxrb {tmp:w}, [{ptr}]"
);
wait_until_changed!(
    /// Monitor-armed wait on a 16-bit location.
    wait_until_changed_u16, AtomicU16, u16, "ldxrh {tmp:w}, [{ptr}]"
);
wait_until_changed!(
    /// Monitor-armed wait on a 32-bit location.
    wait_until_changed_u32, AtomicU32, u32, "ldxr {tmp:w}, [{ptr}]"
);
wait_until_changed!(
    /// Monitor-armed wait on a 64-bit location.
    wait_until_changed_u64, AtomicU64, u64, "ldxr {tmp}, [{ptr}]"
);

// ============================================================================
// Hints and Counters
// ============================================================================

/// Prefetch the cache line for writing (`prfm pstl1keep`). Never faults.
#[inline]
pub(crate) fn prefetch_write(addr: *const ()) {
    unsafe {
        asm!(
            "prfm pstl1keep, [{addr}]",
            addr = in(reg) addr,
            options(nostack, preserves_flags),
        );
    }
}

/// Read the virtual counter (`cntvct_el0`).
///
/// The `isb` keeps the read from being hoisted over earlier instructions;
/// the dead load through a counter-derived address gives later loads a data
/// dependency on the counter value so they cannot speculate ahead of it.
#[inline]
pub(crate) fn cycles() -> u64 {
    let value: u64;
    unsafe {
        asm!(
            "isb",
            "mrs {value}, cntvct_el0",
            "eor {scratch}, {value}, {value}",
            "add {scratch}, sp, {scratch}",
            "ldr xzr, [{scratch}]",
            value = out(reg) value,
            scratch = out(reg) _,
            options(nostack, preserves_flags),
        );
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::Ordering;

    #[test]
    fn test_cmpxchg_hit_and_miss() {
        let word = AtomicU32::new(7);
        assert_eq!(cmpxchg32_acquire(&word, 7, 9), 7);
        assert_eq!(word.load(Ordering::Relaxed), 9);
        assert_eq!(cmpxchg32_release(&word, 7, 11), 9);
        assert_eq!(word.load(Ordering::Relaxed), 9);
        assert_eq!(cmpxchg32_relaxed(&word, 9, 11), 9);
        assert_eq!(word.load(Ordering::Relaxed), 11);
    }

    #[test]
    fn test_fetch_or_returns_previous() {
        let word = AtomicU32::new(0b0101);
        assert_eq!(fetch_or32_acquire(&word, 0b0010), 0b0101);
        assert_eq!(word.load(Ordering::Relaxed), 0b0111);
    }

    #[test]
    fn test_xchg16() {
        let word = AtomicU16::new(0xBEEF);
        assert_eq!(xchg16_release(&word, 0x1234), 0xBEEF);
        assert_eq!(word.load(Ordering::Relaxed), 0x1234);
    }

    #[test]
    fn test_ordered_access_round_trip() {
        let word = AtomicU64::new(0);
        store_release_u64(&word, u64::MAX);
        assert_eq!(load_acquire_u64(&word), u64::MAX);
    }

    #[test]
    fn test_wait_returns_when_value_differs() {
        // The watched value already changed, so the monitor path must not
        // sleep.
        let word = AtomicU32::new(5);
        wait_until_changed_u32(&word, 4);
    }
}
