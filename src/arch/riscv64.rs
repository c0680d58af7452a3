//! # RISC-V (RV64) Backend
//!
//! RISC-V is weakly ordered; acquire/release come from the `.aq`/`.rl`
//! instruction suffixes, applied only where the requested contract asks for
//! them. Two interchangeable sub-paths cover compare-and-swap, chosen at
//! build time by `target_feature = "zacas"`:
//!
//! | Operation        | LR/SC sub-path           | Zacas sub-path |
//! |------------------|--------------------------|----------------|
//! | CAS acquire      | `lr.w.aq` / `sc.w` loop  | `amocas.w.aq`  |
//! | CAS release      | `lr.w` / `sc.w.rl` loop  | `amocas.w.rl`  |
//! | CAS relaxed      | `lr.w` / `sc.w` loop     | `amocas.w`     |
//!
//! Fetch-or needs no loop at all: the base A extension has `amoor.w.aq`, a
//! native ordered read-modify-write. The 16-bit exchange and the ordered
//! loads/stores go through the toolchain's atomic lowering (no halfword AMO
//! exists before Zabha, and ordered accesses are fence-based here), which
//! keeps them atomic on every RV64 core.
//!
//! One RV64 wrinkle shows up throughout: `lr.w`, `amocas.w`, and `amoor.w`
//! sign-extend the loaded 32-bit value into the destination register, so
//! any register compared against it must be sign-extended the same way, and
//! results are truncated back to 32 bits on the way out.

use core::arch::asm;
use core::sync::atomic::{AtomicU8, AtomicU16, AtomicU32, AtomicU64, Ordering};

// ============================================================================
// Compare-and-Swap
// ============================================================================

/// 32-bit compare-and-swap, acquire-ordered.
#[cfg(target_feature = "zacas")]
#[inline]
pub(crate) fn cmpxchg32_acquire(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: i64;
    unsafe {
        asm!(
            "amocas.w.aq {prev}, {new}, ({ptr})",
            prev = inout(reg) expected as i32 as i64 => prev,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack),
        );
    }
    prev as u32
}

/// 32-bit compare-and-swap, acquire-ordered.
///
/// The reservation load carries the acquire; the conditional store is
/// plain.
#[cfg(not(target_feature = "zacas"))]
#[inline]
pub(crate) fn cmpxchg32_acquire(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: i64;
    unsafe {
        asm!(
            "1:",
            "lr.w.aq {prev}, ({ptr})",
            "bne {prev}, {expected}, 2f",
            "sc.w {status}, {new}, ({ptr})",
            "bnez {status}, 1b",
            "2:",
            prev = out(reg) prev,
            status = out(reg) _,
            expected = in(reg) expected as i32 as i64,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack),
        );
    }
    prev as u32
}

/// 32-bit compare-and-swap, release-ordered.
#[cfg(target_feature = "zacas")]
#[inline]
pub(crate) fn cmpxchg32_release(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: i64;
    unsafe {
        asm!(
            "amocas.w.rl {prev}, {new}, ({ptr})",
            prev = inout(reg) expected as i32 as i64 => prev,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack),
        );
    }
    prev as u32
}

/// 32-bit compare-and-swap, release-ordered.
///
/// The conditional store carries the release; the reservation load is
/// plain.
#[cfg(not(target_feature = "zacas"))]
#[inline]
pub(crate) fn cmpxchg32_release(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: i64;
    unsafe {
        asm!(
            "1:",
            "lr.w {prev}, ({ptr})",
            "bne {prev}, {expected}, 2f",
            "sc.w.rl {status}, {new}, ({ptr})",
            "bnez {status}, 1b",
            "2:",
            prev = out(reg) prev,
            status = out(reg) _,
            expected = in(reg) expected as i32 as i64,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack),
        );
    }
    prev as u32
}

/// 32-bit compare-and-swap, relaxed. Atomicity only, no ordering suffix.
#[cfg(target_feature = "zacas")]
#[inline]
pub(crate) fn cmpxchg32_relaxed(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: i64;
    unsafe {
        asm!(
            "amocas.w {prev}, {new}, ({ptr})",
            prev = inout(reg) expected as i32 as i64 => prev,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack),
        );
    }
    prev as u32
}

/// 32-bit compare-and-swap, relaxed. Atomicity only, no ordering suffix.
#[cfg(not(target_feature = "zacas"))]
#[inline]
pub(crate) fn cmpxchg32_relaxed(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    let prev: i64;
    unsafe {
        asm!(
            "1:",
            "lr.w {prev}, ({ptr})",
            "bne {prev}, {expected}, 2f",
            "sc.w {status}, {new}, ({ptr})",
            "bnez {status}, 1b",
            "2:",
            prev = out(reg) prev,
            status = out(reg) _,
            expected = in(reg) expected as i32 as i64,
            new = in(reg) new,
            ptr = in(reg) word.as_ptr(),
            options(nostack),
        );
    }
    prev as u32
}

// ============================================================================
// Fetch-Or / Exchange
// ============================================================================

/// Atomic `word |= mask`, acquire-ordered, returning the prior value
/// (`amoor.w.aq`: one native ordered read-modify-write).
#[inline]
pub(crate) fn fetch_or32_acquire(word: &AtomicU32, mask: u32) -> u32 {
    let prev: i64;
    unsafe {
        asm!(
            "amoor.w.aq {prev}, {mask}, ({ptr})",
            prev = out(reg) prev,
            mask = in(reg) mask,
            ptr = in(reg) word.as_ptr(),
            options(nostack),
        );
    }
    prev as u32
}

/// Atomic 16-bit exchange, release-ordered, returning the prior value.
///
/// No halfword AMO exists before Zabha; the toolchain lowers this to a
/// masked LR/SC loop on the containing aligned word.
#[inline]
pub(crate) fn xchg16_release(word: &AtomicU16, val: u16) -> u16 {
    word.swap(val, Ordering::Release)
}

// ============================================================================
// Ordered Loads and Stores
// ============================================================================

/// Acquire load, 8-bit (fence-based lowering).
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

/// Release store, 8-bit (fence-based lowering).
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

// No unprivileged event-wait instruction is assumed (Zawrs is not required
// of the targets this backend serves), so the inter-poll hint is the pause
// hint and the conditional-load loop re-reads immediately.

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

/// Write-intent prefetch. `prefetch.w` needs Zicbop, which is not assumed;
/// the hint is a no-op here.
#[inline]
pub(crate) fn prefetch_write(_addr: *const ()) {}

/// Read the cycle counter CSR.
#[inline]
pub(crate) fn cycles() -> u64 {
    let value: u64;
    unsafe {
        asm!(
            "csrr {}, cycle",
            out(reg) value,
            options(nomem, nostack, preserves_flags),
        );
    }
    value
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
    fn test_cmpxchg_sign_bit_values() {
        // Values with bit 31 set exercise the sign-extension handling.
        let word = AtomicU32::new(0x8000_0001);
        assert_eq!(cmpxchg32_acquire(&word, 0x8000_0001, 0xFFFF_FFFF), 0x8000_0001);
        assert_eq!(word.load(Ordering::Relaxed), 0xFFFF_FFFF);
        assert_eq!(cmpxchg32_relaxed(&word, 0, 1), 0xFFFF_FFFF);
        assert_eq!(word.load(Ordering::Relaxed), 0xFFFF_FFFF);
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
}
