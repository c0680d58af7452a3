//! # x86_64 Backend
//!
//! x86_64 is a total-store-order machine: ordinary loads already carry
//! acquire semantics and ordinary stores carry release semantics, so the
//! acquire/release accessors only have to pin down compiler ordering. The
//! read-modify-write operations are where the hardware needs explicit
//! direction:
//!
//! | Operation           | Instruction                  |
//! |---------------------|------------------------------|
//! | compare-and-swap    | `lock cmpxchg` (all orders)  |
//! | 16-bit exchange     | `xchg` (implicitly locked)   |
//! | fetch-or            | `lock cmpxchg` retry loop    |
//! | write-intent hint   | `prefetchw`                  |
//! | cycle counter       | `rdtsc`                      |
//!
//! A single `lock cmpxchg` encoding serves the acquire, release, and relaxed
//! variants; the tags differ only on weakly-ordered machines.

use core::arch::asm;
use core::sync::atomic::{AtomicU8, AtomicU16, AtomicU32, AtomicU64, Ordering};

// ============================================================================
// Compare-and-Swap
// ============================================================================

/// One locked compare-and-exchange, returning the value observed before the
/// attempt.
///
/// `cmpxchg` takes its expectation in `eax` and leaves the observed value
/// there; ZF is clobbered, so the flags cannot be declared preserved.
#[inline]
fn lock_cmpxchg32(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: u32;
    unsafe {
        asm!(
            "lock cmpxchg dword ptr [{ptr}], {new:e}",
            ptr = in(reg) word.as_ptr(),
            new = in(reg) new,
            inout("eax") expected => prev,
            options(nostack),
        );
    }
    prev
}

/// 32-bit compare-and-swap, acquire-ordered.
#[inline]
pub(crate) fn cmpxchg32_acquire(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    lock_cmpxchg32(word, expected, new)
}

/// 32-bit compare-and-swap, release-ordered.
#[inline]
pub(crate) fn cmpxchg32_release(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    lock_cmpxchg32(word, expected, new)
}

/// 32-bit compare-and-swap, relaxed.
#[inline]
pub(crate) fn cmpxchg32_relaxed(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    lock_cmpxchg32(word, expected, new)
}

// ============================================================================
// Fetch-Or / Exchange
// ============================================================================

/// Atomic `word |= mask`, acquire-ordered, returning the prior value.
///
/// No x86 instruction both ors and hands back the previous contents, so
/// this is the compare-and-swap retry loop. The body is idempotent; on a
/// lost race the observed value seeds the next attempt.
#[inline]
pub(crate) fn fetch_or32_acquire(word: &AtomicU32, mask: u32) -> u32 {
    let mut old = word.load(Ordering::Relaxed);
    loop {
        let seen = cmpxchg32_acquire(word, old, old | mask);
        if seen == old {
            return old;
        }
        old = seen;
    }
}

/// Atomic 16-bit exchange, release-ordered, returning the prior value.
///
/// `xchg` with a memory operand asserts the bus lock on its own and is a
/// full fence, which more than covers the release contract.
#[inline]
pub(crate) fn xchg16_release(word: &AtomicU16, val: u16) -> u16 {
    let prev: u16;
    unsafe {
        asm!(
            "xchg word ptr [{ptr}], {val:x}",
            ptr = in(reg) word.as_ptr(),
            val = inout(reg) val => prev,
            options(nostack, preserves_flags),
        );
    }
    prev
}

// ============================================================================
// Ordered Loads and Stores
// ============================================================================

/// Acquire load, 8-bit. Plain `mov` on TSO; the tag constrains the compiler.
#[inline]
pub(crate) fn load_acquire_u8(word: &AtomicU8) -> u8 {
    word.load(Ordering::Acquire)
}

/// Acquire load, 16-bit.
#[inline]
pub(crate) fn load_acquire_u16(word: &AtomicU16) -> u16 {
    word.load(Ordering::Acquire)
}

/// Acquire load, 32-bit.
#[inline]
pub(crate) fn load_acquire_u32(word: &AtomicU32) -> u32 {
    word.load(Ordering::Acquire)
}

/// Acquire load, 64-bit.
#[inline]
pub(crate) fn load_acquire_u64(word: &AtomicU64) -> u64 {
    word.load(Ordering::Acquire)
}

/// Release store, 8-bit. Plain `mov` on TSO; the tag constrains the compiler.
#[inline]
pub(crate) fn store_release_u8(word: &AtomicU8, val: u8) {
    word.store(val, Ordering::Release);
}

/// Release store, 16-bit.
#[inline]
pub(crate) fn store_release_u16(word: &AtomicU16, val: u16) {
    word.store(val, Ordering::Release);
}

/// Release store, 32-bit.
#[inline]
pub(crate) fn store_release_u32(word: &AtomicU32, val: u32) {
    word.store(val, Ordering::Release);
}

/// Release store, 64-bit.
#[inline]
pub(crate) fn store_release_u64(word: &AtomicU64, val: u64) {
    word.store(val, Ordering::Release);
}

// ============================================================================
// Spin-Wait Hint
// ============================================================================

// x86 has no unprivileged monitor/wait pair, so the inter-poll hint is a
// `pause`; the conditional-load loop re-reads immediately.

/// Between-polls hint, 8-bit location.
#[inline]
pub(crate) fn wait_until_changed_u8(_word: &AtomicU8, _observed: u8) {
    core::hint::spin_loop();
}

/// Between-polls hint, 16-bit location.
#[inline]
pub(crate) fn wait_until_changed_u16(_word: &AtomicU16, _observed: u16) {
    core::hint::spin_loop();
}

/// Between-polls hint, 32-bit location.
#[inline]
pub(crate) fn wait_until_changed_u32(_word: &AtomicU32, _observed: u32) {
    core::hint::spin_loop();
}

/// Between-polls hint, 64-bit location.
#[inline]
pub(crate) fn wait_until_changed_u64(_word: &AtomicU64, _observed: u64) {
    core::hint::spin_loop();
}

// ============================================================================
// Hints and Counters
// ============================================================================

/// Prefetch the cache line for writing (`prefetchw`). Never faults.
#[inline]
pub(crate) fn prefetch_write(addr: *const ()) {
    unsafe {
        asm!(
            "prefetchw [{addr}]",
            addr = in(reg) addr,
            options(nostack, preserves_flags),
        );
    }
}

/// Read the time-stamp counter.
#[inline]
pub(crate) fn cycles() -> u64 {
    let lo: u32;
    let hi: u32;
    unsafe {
        asm!(
            "rdtsc",
            out("eax") lo,
            out("edx") hi,
            options(nomem, nostack, preserves_flags),
        );
    }
    (u64::from(hi) << 32) | u64::from(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_prefetch_and_cycles() {
        let word = AtomicU32::new(0);
        prefetch_write(word.as_ptr().cast());
        let a = cycles();
        let b = cycles();
        assert!(b >= a);
    }
}
