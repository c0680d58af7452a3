//! # Conditional Spin-Wait
//!
//! Poll-until-predicate loops over an [`AtomicWord`]. Each iteration reads
//! the word, evaluates the caller's predicate, and either returns the
//! value or waits for the location to (possibly) change before polling
//! again. On aarch64 the wait arms the exclusive monitor and sleeps on
//! `wfe` instead of burning the core; everywhere else it is a pause-hinted
//! busy poll, which is always a correct fallback.
//!
//! The loops are unbounded: no timeout, no retry cap. A caller
//! that needs a deadline folds the check into its predicate, typically
//! against [`cycles()`](crate::cycles()):
//!
//! ```ignore
//! let deadline = cycles() + budget;
//! let v = word.cond_load_relaxed(|v| v != 0 || cycles() > deadline);
//! ```

use crate::atomic::AtomicWord;
use crate::word::Word;

impl<T: Word> AtomicWord<T> {
    /// Acquire-loads the word until `pred` accepts the value, then returns
    /// that value.
    ///
    /// Each poll is a full acquire load, so when the loop exits, everything
    /// the thread that published the accepted value did beforehand is
    /// visible. The wait between failing polls may wake spuriously; the
    /// predicate simply runs again on a fresh read.
    #[inline]
    pub fn cond_load_acquire(&self, mut pred: impl FnMut(T) -> bool) -> T {
        loop {
            let value = self.load_acquire();
            if pred(value) {
                return value;
            }
            T::wait_until_changed(&self.repr, value);
        }
    }

    /// Polls the word with plain single-copy reads until `pred` accepts
    /// the value, then returns that value. No ordering: use this when the
    /// word itself is the only state of interest, or follow it with an
    /// acquire operation.
    #[inline]
    pub fn cond_load_relaxed(&self, mut pred: impl FnMut(T) -> bool) -> T {
        loop {
            let value = self.read_once();
            if pred(value) {
                return value;
            }
            T::wait_until_changed(&self.repr, value);
        }
    }
}

/// Polite busy-wait hint for caller-written spin loops (`pause` on x86_64,
/// its equivalents elsewhere). Yields nothing to the OS; it only eases
/// pipeline and power pressure inside a tight loop.
#[inline]
pub fn cpu_relax() {
    core::hint::spin_loop();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cond_load_returns_matching_value() {
        let word = AtomicWord::<u32>::new(3);
        assert_eq!(word.cond_load_acquire(|v| v == 3), 3);
        assert_eq!(word.cond_load_relaxed(|v| v != 0), 3);
    }

    #[test]
    fn test_cond_load_sees_predicate_side_effects() {
        // A failing poll feeds the observed value to the predicate; make
        // the predicate itself flip the word so the loop must terminate
        // single-threadedly.
        let word = AtomicWord::<u16>::new(0);
        let mut polls = 0u32;
        let got = word.cond_load_relaxed(|v| {
            polls += 1;
            if polls == 3 {
                word.write_once(7);
            }
            v == 7
        });
        assert_eq!(got, 7);
        assert!(polls >= 4);
    }

    #[test]
    fn test_cpu_relax_is_callable() {
        for _ in 0..16 {
            cpu_relax();
        }
    }
}
