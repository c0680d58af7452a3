//! # Generic Backend
//!
//! Fallback for targets without a hand-coded instruction menu. Every
//! operation delegates to the toolchain's built-in ordered atomics, which
//! are required to exist for all four widths before this module is even
//! selected (the dispatch layer fails the build otherwise). Nothing here
//! may ever degrade to a plain, non-atomic access.

use core::sync::atomic::{AtomicU8, AtomicU16, AtomicU32, AtomicU64, Ordering};

// ============================================================================
// Compare-and-Swap
// ============================================================================

/// 32-bit compare-and-swap, acquire-ordered.
#[inline]
pub(crate) fn cmpxchg32_acquire(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    match word.compare_exchange(expected, new, Ordering::Acquire, Ordering::Acquire) {
        Ok(prev) | Err(prev) => prev,
    }
}

/// 32-bit compare-and-swap, release-ordered.
#[inline]
pub(crate) fn cmpxchg32_release(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    match word.compare_exchange(expected, new, Ordering::Release, Ordering::Relaxed) {
        Ok(prev) | Err(prev) => prev,
    }
}

/// 32-bit compare-and-swap, relaxed.
#[inline]
pub(crate) fn cmpxchg32_relaxed(word: &AtomicU32, expected: u32, new: u32) -> u32 {
    match word.compare_exchange(expected, new, Ordering::Relaxed, Ordering::Relaxed) {
        Ok(prev) | Err(prev) => prev,
    }
}

// ============================================================================
// Fetch-Or / Exchange
// ============================================================================

/// Atomic `word |= mask`, acquire-ordered, returning the prior value.
#[inline]
pub(crate) fn fetch_or32_acquire(word: &AtomicU32, mask: u32) -> u32 {
    word.fetch_or(mask, Ordering::Acquire)
}

/// Atomic 16-bit exchange, release-ordered, returning the prior value.
#[inline]
pub(crate) fn xchg16_release(word: &AtomicU16, val: u16) -> u16 {
    word.swap(val, Ordering::Release)
}

// ============================================================================
// Ordered Loads and Stores
// ============================================================================

/// Acquire load, 8-bit.
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

/// Release store, 8-bit.
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
// Hints
// ============================================================================

/// Write-intent prefetch. No portable spelling exists; no-op.
#[inline]
pub(crate) fn prefetch_write(_addr: *const ()) {}
