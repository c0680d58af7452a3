//! # Atomic Words
//!
//! [`AtomicWord<T>`] is a caller-owned, naturally aligned memory location
//! of 1, 2, 4, or 8 bytes, accessed exclusively through the operations
//! below once it is shared between threads. Every operation is a
//! single-copy atomic: an observer sees a value some writer stored in
//! full, never a byte-wise mix. Nothing here allocates, and no operation
//! can fail at run time; unsupported widths and unsupported targets are
//! build errors, not fallbacks.
//!
//! ## Operation Set
//!
//! | Operation                     | Width    | Ordering        |
//! |-------------------------------|----------|-----------------|
//! | `read_once` / `write_once`    | all      | none (atomicity only) |
//! | `load_acquire` / `store_release` | all   | acquire / release |
//! | `cmpxchg_{acquire,release,relaxed}` | 32-bit | per name    |
//! | `try_cmpxchg_{acquire,relaxed}` | 32-bit | per name       |
//! | `fetch_or_acquire`            | 32-bit   | acquire         |
//! | `exchange_release`            | 16-bit   | release         |
//! | `cond_load_{acquire,relaxed}` | all      | per name        |
//!
//! A release store publishes everything the writer did before it: a thread
//! whose acquire load observes the released value also observes all of the
//! writer's earlier writes. Relaxed operations carry atomicity and nothing
//! else; they must never be the only thing guarding non-atomic state.

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicU16, AtomicU32, AtomicU64};

use static_assertions::{assert_eq_align, assert_eq_size};

use crate::arch;
use crate::word::Word;

/// A fixed-width word with architecture-tuned atomic operations.
///
/// The caller owns the storage; embed the word wherever the protected
/// state lives (a lock field, a sequence counter, a queue tail). `new` is
/// `const`, so words work in `static`s. Spell out the width when calling
/// it: `new` is defined per width, so the bare `AtomicWord::new(0)` form
/// is ambiguous.
///
/// ```
/// use atomic_word::AtomicWord;
///
/// static READY: AtomicWord<u32> = AtomicWord::<u32>::new(0);
///
/// READY.store_release(1);
/// assert_eq!(READY.load_acquire(), 1);
/// ```
#[repr(transparent)]
pub struct AtomicWord<T: Word> {
    pub(crate) repr: T::Repr,
}

// Layout invariants: a word is exactly its scalar, and the storage carries
// the alignment its width requires on every target.
assert_eq_size!(AtomicWord<u8>, u8);
assert_eq_size!(AtomicWord<u16>, u16);
assert_eq_size!(AtomicWord<u32>, u32);
assert_eq_size!(AtomicWord<u64>, u64);
assert_eq_align!(AtomicWord<u8>, AtomicU8);
assert_eq_align!(AtomicWord<u16>, AtomicU16);
assert_eq_align!(AtomicWord<u32>, AtomicU32);
assert_eq_align!(AtomicWord<u64>, AtomicU64);

macro_rules! const_new {
    ($($bits:literal, $ty:ty => $repr:ty);* $(;)?) => {$(
        impl AtomicWord<$ty> {
            #[doc = concat!("Creates a ", $bits, "-bit word holding `v`.")]
            #[inline]
            pub const fn new(v: $ty) -> Self {
                Self { repr: <$repr>::new(v) }
            }
        }
    )*};
}

const_new! {
    "8", u8 => AtomicU8;
    "16", u16 => AtomicU16;
    "32", u32 => AtomicU32;
    "64", u64 => AtomicU64;
}

// ============================================================================
// Width-Generic Operations
// ============================================================================

impl<T: Word> AtomicWord<T> {
    /// Reads the word in a single copy, with no inter-thread ordering.
    ///
    /// The compiler can neither split, merge, nor elide the access, but
    /// nothing orders it against other memory traffic. Pair it with
    /// [`barrier()`](crate::barrier()) or use
    /// [`load_acquire`](Self::load_acquire) when ordering matters.
    #[inline]
    pub fn read_once(&self) -> T {
        T::read_once(&self.repr)
    }

    /// Writes the word in a single copy, with no inter-thread ordering.
    #[inline]
    pub fn write_once(&self, v: T) {
        T::write_once(&self.repr, v);
    }

    /// Reads the word with acquire ordering.
    ///
    /// If the value read was published by a [`store_release`]
    /// (or another release-tagged operation), everything that writer did
    /// before publishing is visible after this load returns.
    ///
    /// [`store_release`]: Self::store_release
    #[inline]
    pub fn load_acquire(&self) -> T {
        T::load_acquire(&self.repr)
    }

    /// Writes the word with release ordering, publishing all of the
    /// calling thread's prior writes to any thread that subsequently
    /// acquire-loads this value.
    #[inline]
    pub fn store_release(&self, v: T) {
        T::store_release(&self.repr, v);
    }

    /// Returns a mutable reference to the scalar. Safe because exclusive
    /// borrow of the word means no other thread can be accessing it.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        T::repr_get_mut(&mut self.repr)
    }

    /// Consumes the word and returns the contained scalar.
    #[inline]
    pub fn into_inner(self) -> T {
        T::repr_into_inner(self.repr)
    }

    /// Hints that this word's cache line is about to be written.
    ///
    /// Purely a performance hint ahead of a read-modify-write burst; never
    /// faults, never orders anything.
    #[inline]
    pub fn prefetch_write(&self) {
        arch::imp::prefetch_write((&self.repr as *const T::Repr).cast());
    }
}

// ============================================================================
// Compare-and-Swap Family (32-bit)
// ============================================================================

impl AtomicWord<u32> {
    /// Compare-and-swap, acquire-ordered: stores `new` iff the current
    /// value equals `expected`, and returns the value observed before the
    /// attempt (`expected` on success, the differing value on failure).
    ///
    /// One attempt, no retry. The ordering tag governs only the
    /// visibility of surrounding memory. ABA (the value changing and
    /// changing back between a read and the swap) is the caller's problem;
    /// no versioning happens here.
    #[inline]
    pub fn cmpxchg_acquire(&self, expected: u32, new: u32) -> u32 {
        arch::imp::cmpxchg32_acquire(&self.repr, expected, new)
    }

    /// Compare-and-swap, release-ordered. See
    /// [`cmpxchg_acquire`](Self::cmpxchg_acquire) for the contract.
    #[inline]
    pub fn cmpxchg_release(&self, expected: u32, new: u32) -> u32 {
        arch::imp::cmpxchg32_release(&self.repr, expected, new)
    }

    /// Compare-and-swap, relaxed: atomicity only. See
    /// [`cmpxchg_acquire`](Self::cmpxchg_acquire) for the contract.
    #[inline]
    pub fn cmpxchg_relaxed(&self, expected: u32, new: u32) -> u32 {
        arch::imp::cmpxchg32_relaxed(&self.repr, expected, new)
    }

    /// Compare-and-exchange, acquire-ordered: returns `true` and stores
    /// `new` iff the swap succeeded. On failure `*expected` is overwritten
    /// with the just-observed value, so a retry loop can recompute its
    /// next attempt from fresh data without a separate re-read:
    ///
    /// ```
    /// use atomic_word::AtomicWord;
    ///
    /// let word = AtomicWord::<u32>::new(10);
    /// let mut current = word.read_once();
    /// // Saturating-add one, recomputed from the refreshed expectation
    /// // on every attempt until the swap commits.
    /// loop {
    ///     let next = current.saturating_add(1);
    ///     if word.try_cmpxchg_acquire(&mut current, next) {
    ///         break;
    ///     }
    /// }
    /// assert_eq!(word.read_once(), 11);
    /// ```
    #[inline]
    pub fn try_cmpxchg_acquire(&self, expected: &mut u32, new: u32) -> bool {
        let seen = self.cmpxchg_acquire(*expected, new);
        if seen == *expected {
            true
        } else {
            *expected = seen;
            false
        }
    }

    /// Compare-and-exchange, relaxed. See
    /// [`try_cmpxchg_acquire`](Self::try_cmpxchg_acquire) for the contract.
    #[inline]
    pub fn try_cmpxchg_relaxed(&self, expected: &mut u32, new: u32) -> bool {
        let seen = self.cmpxchg_relaxed(*expected, new);
        if seen == *expected {
            true
        } else {
            *expected = seen;
            false
        }
    }

    /// Atomically ors `mask` into the word, acquire-ordered, returning the
    /// prior value.
    ///
    /// Backends with a native ordered or-instruction use it; the rest run
    /// a compare-and-swap retry loop. Either way there is no retry bound:
    /// termination rests on hardware coherency arbitration, and a caller
    /// needing a deadline must check it between its own attempts.
    #[inline]
    pub fn fetch_or_acquire(&self, mask: u32) -> u32 {
        arch::imp::fetch_or32_acquire(&self.repr, mask)
    }
}

// ============================================================================
// Exchange (16-bit)
// ============================================================================

impl AtomicWord<u16> {
    /// Atomically replaces the word with `val`, release-ordered, returning
    /// the prior value. The caller's earlier writes are visible to any
    /// thread that subsequently observes `val` here.
    #[inline]
    pub fn exchange_release(&self, val: u16) -> u16 {
        arch::imp::xchg16_release(&self.repr, val)
    }
}

// ============================================================================
// Trait Impls
// ============================================================================

impl<T: Word + Default> Default for AtomicWord<T> {
    fn default() -> Self {
        Self {
            repr: T::repr_new(T::default()),
        }
    }
}

impl<T: Word> From<T> for AtomicWord<T> {
    fn from(v: T) -> Self {
        Self {
            repr: T::repr_new(v),
        }
    }
}

impl<T: Word + fmt::Debug> fmt::Debug for AtomicWord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicWord").field(&self.read_once()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_widths() {
        let w8 = AtomicWord::<u8>::new(0);
        for v in [0, 1, 0x7F, 0x80, u8::MAX] {
            w8.write_once(v);
            assert_eq!(w8.read_once(), v);
        }

        let w16 = AtomicWord::<u16>::new(0);
        for v in [0, 1, 0x7FFF, 0x8000, u16::MAX] {
            w16.write_once(v);
            assert_eq!(w16.read_once(), v);
        }

        let w32 = AtomicWord::<u32>::new(0);
        for v in [0, 1, 0x7FFF_FFFF, 0x8000_0000, u32::MAX] {
            w32.write_once(v);
            assert_eq!(w32.read_once(), v);
        }

        let w64 = AtomicWord::<u64>::new(0);
        for v in [0, 1, u64::from(u32::MAX) + 1, u64::MAX] {
            w64.write_once(v);
            assert_eq!(w64.read_once(), v);
        }
    }

    #[test]
    fn test_acquire_release_round_trip_all_widths() {
        let w8 = AtomicWord::<u8>::new(0);
        w8.store_release(0xA5);
        assert_eq!(w8.load_acquire(), 0xA5);

        let w16 = AtomicWord::<u16>::new(0);
        w16.store_release(0xA55A);
        assert_eq!(w16.load_acquire(), 0xA55A);

        let w32 = AtomicWord::<u32>::new(0);
        w32.store_release(0xDEAD_BEEF);
        assert_eq!(w32.load_acquire(), 0xDEAD_BEEF);

        let w64 = AtomicWord::<u64>::new(0);
        w64.store_release(0xDEAD_BEEF_F00D_CAFE);
        assert_eq!(w64.load_acquire(), 0xDEAD_BEEF_F00D_CAFE);
    }

    #[test]
    fn test_cmpxchg_success() {
        let word = AtomicWord::<u32>::new(5);
        assert_eq!(word.cmpxchg_acquire(5, 6), 5);
        assert_eq!(word.read_once(), 6);
        assert_eq!(word.cmpxchg_release(6, 7), 6);
        assert_eq!(word.read_once(), 7);
        assert_eq!(word.cmpxchg_relaxed(7, 8), 7);
        assert_eq!(word.read_once(), 8);
    }

    #[test]
    fn test_cmpxchg_failure_leaves_value() {
        let word = AtomicWord::<u32>::new(42);
        assert_eq!(word.cmpxchg_acquire(41, 99), 42);
        assert_eq!(word.read_once(), 42);
        assert_eq!(word.cmpxchg_release(43, 99), 42);
        assert_eq!(word.read_once(), 42);
        assert_eq!(word.cmpxchg_relaxed(0, 99), 42);
        assert_eq!(word.read_once(), 42);
    }

    #[test]
    fn test_try_cmpxchg_success_keeps_expected() {
        let word = AtomicWord::<u32>::new(3);
        let mut expected = 3;
        assert!(word.try_cmpxchg_acquire(&mut expected, 4));
        assert_eq!(expected, 3);
        assert_eq!(word.read_once(), 4);
    }

    #[test]
    fn test_try_cmpxchg_failure_updates_expected() {
        let word = AtomicWord::<u32>::new(10);
        let mut expected = 7;
        assert!(!word.try_cmpxchg_relaxed(&mut expected, 8));
        assert_eq!(expected, 10);
        assert_eq!(word.read_once(), 10);

        // The refreshed expectation succeeds on the next attempt.
        assert!(word.try_cmpxchg_relaxed(&mut expected, 8));
        assert_eq!(word.read_once(), 8);
    }

    #[test]
    fn test_try_cmpxchg_retry_loop_converges() {
        let word = AtomicWord::<u32>::new(0);
        for _ in 0..100 {
            let mut current = word.read_once();
            loop {
                let next = current + 1;
                if word.try_cmpxchg_acquire(&mut current, next) {
                    break;
                }
            }
        }
        assert_eq!(word.read_once(), 100);
    }

    #[test]
    fn test_fetch_or_returns_previous() {
        let word = AtomicWord::<u32>::new(0b1000);
        assert_eq!(word.fetch_or_acquire(0b0011), 0b1000);
        assert_eq!(word.read_once(), 0b1011);
    }

    #[test]
    fn test_fetch_or_zero_mask() {
        let word = AtomicWord::<u32>::new(0x1234_5678);
        assert_eq!(word.fetch_or_acquire(0), 0x1234_5678);
        assert_eq!(word.read_once(), 0x1234_5678);
    }

    #[test]
    fn test_fetch_or_full_mask() {
        let word = AtomicWord::<u32>::new(0x0F0F_0F0F);
        assert_eq!(word.fetch_or_acquire(0xFFFF_FFFF), 0x0F0F_0F0F);
        assert_eq!(word.read_once(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_exchange_release() {
        let word = AtomicWord::<u16>::new(0xAAAA);
        assert_eq!(word.exchange_release(0x5555), 0xAAAA);
        assert_eq!(word.read_once(), 0x5555);
        assert_eq!(word.exchange_release(0), 0x5555);
        assert_eq!(word.read_once(), 0);
    }

    #[test]
    fn test_get_mut_and_into_inner() {
        let mut word = AtomicWord::<u64>::new(1);
        *word.get_mut() = 17;
        assert_eq!(word.read_once(), 17);
        assert_eq!(word.into_inner(), 17);
    }

    #[test]
    fn test_const_new_in_static() {
        static WORD: AtomicWord<u32> = AtomicWord::<u32>::new(11);
        static NARROW: AtomicWord<u8> = AtomicWord::<u8>::new(3);
        assert_eq!(WORD.read_once(), 11);
        assert_eq!(NARROW.read_once(), 3);
    }

    #[test]
    fn test_from_default_debug() {
        let word = AtomicWord::from(9u8);
        assert_eq!(word.read_once(), 9);

        let word = AtomicWord::<u16>::default();
        assert_eq!(word.read_once(), 0);

        let word = AtomicWord::<u32>::new(3);
        assert_eq!(format!("{word:?}"), "AtomicWord(3)");
    }

    #[test]
    fn test_prefetch_write_is_inert() {
        let word = AtomicWord::<u32>::new(21);
        word.prefetch_write();
        assert_eq!(word.read_once(), 21);
    }
}
