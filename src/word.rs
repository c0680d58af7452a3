//! # Width Dispatch
//!
//! The four supported widths are wired to their backend entry points
//! through the sealed [`Word`] trait. Width selection is entirely a
//! compile-time affair: a width with no `Word` impl has no
//! [`AtomicWord`](crate::AtomicWord) and the program does not build. There
//! is no run-time size switch left to fall through.

use core::sync::atomic::{AtomicU8, AtomicU16, AtomicU32, AtomicU64, Ordering};

use crate::arch;

mod sealed {
    pub trait Sealed {}
}

/// Marker for the integer widths an [`AtomicWord`](crate::AtomicWord) can
/// hold: `u8`, `u16`, `u32`, `u64`.
///
/// The trait is sealed; it exists so every operation on an `AtomicWord`
/// resolves to the one instruction sequence the active backend defines for
/// that width. Any other operand type is rejected while compiling:
///
/// ```compile_fail
/// use atomic_word::AtomicWord;
///
/// fn unsupported(word: &AtomicWord<u128>) {}
/// ```
pub trait Word: Copy + Eq + sealed::Sealed {
    /// The built-in atomic type that backs the storage for this width.
    #[doc(hidden)]
    type Repr;

    #[doc(hidden)]
    fn repr_new(v: Self) -> Self::Repr;

    #[doc(hidden)]
    fn repr_get_mut(repr: &mut Self::Repr) -> &mut Self;

    #[doc(hidden)]
    fn repr_into_inner(repr: Self::Repr) -> Self;

    #[doc(hidden)]
    fn read_once(repr: &Self::Repr) -> Self;

    #[doc(hidden)]
    fn write_once(repr: &Self::Repr, v: Self);

    #[doc(hidden)]
    fn load_acquire(repr: &Self::Repr) -> Self;

    #[doc(hidden)]
    fn store_release(repr: &Self::Repr, v: Self);

    #[doc(hidden)]
    fn wait_until_changed(repr: &Self::Repr, observed: Self);
}

macro_rules! impl_word {
    ($ty:ty, $repr:ty, $load:ident, $store:ident, $wait:ident) => {
        impl sealed::Sealed for $ty {}

        impl Word for $ty {
            type Repr = $repr;

            #[inline]
            fn repr_new(v: Self) -> $repr {
                <$repr>::new(v)
            }

            #[inline]
            fn repr_get_mut(repr: &mut $repr) -> &mut Self {
                repr.get_mut()
            }

            #[inline]
            fn repr_into_inner(repr: $repr) -> Self {
                repr.into_inner()
            }

            // Single-copy accesses: relaxed on the repr, which is a marked
            // plain access on every supported target. No ordering.
            #[inline]
            fn read_once(repr: &$repr) -> Self {
                repr.load(Ordering::Relaxed)
            }

            #[inline]
            fn write_once(repr: &$repr, v: Self) {
                repr.store(v, Ordering::Relaxed);
            }

            #[inline]
            fn load_acquire(repr: &$repr) -> Self {
                arch::imp::$load(repr)
            }

            #[inline]
            fn store_release(repr: &$repr, v: Self) {
                arch::imp::$store(repr, v)
            }

            #[inline]
            fn wait_until_changed(repr: &$repr, observed: Self) {
                arch::imp::$wait(repr, observed)
            }
        }
    };
}

impl_word!(u8, AtomicU8, load_acquire_u8, store_release_u8, wait_until_changed_u8);
impl_word!(u16, AtomicU16, load_acquire_u16, store_release_u16, wait_until_changed_u16);
impl_word!(u32, AtomicU32, load_acquire_u32, store_release_u32, wait_until_changed_u32);
impl_word!(u64, AtomicU64, load_acquire_u64, store_release_u64, wait_until_changed_u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_ops_route_to_backend() {
        let word = AtomicU32::new(1);
        <u32 as Word>::store_release(&word, 2);
        assert_eq!(<u32 as Word>::load_acquire(&word), 2);
        assert_eq!(<u32 as Word>::read_once(&word), 2);
        // The watched value already differs, so the wait returns at once.
        <u32 as Word>::wait_until_changed(&word, 1);
    }

    #[test]
    fn test_trait_ops_cover_every_width() {
        let word = AtomicU8::new(0);
        <u8 as Word>::write_once(&word, 9);
        assert_eq!(<u8 as Word>::load_acquire(&word), 9);

        let word = AtomicU16::new(0);
        <u16 as Word>::store_release(&word, 0x1234);
        assert_eq!(<u16 as Word>::read_once(&word), 0x1234);

        let word = AtomicU64::new(0);
        <u64 as Word>::store_release(&word, u64::MAX);
        assert_eq!(<u64 as Word>::load_acquire(&word), u64::MAX);
    }
}
