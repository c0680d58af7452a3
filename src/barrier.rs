//! Compiler-only ordering fence.

use core::sync::atomic::{compiler_fence, Ordering};

/// Forbids the compiler from moving memory accesses across this point.
///
/// Emits no hardware instruction: on a strongly-ordered machine this is
/// all a plain-access ordering needs, and on a weakly-ordered machine it
/// pairs with the ordered instructions the other primitives emit. It does
/// not order the CPU's own memory traffic.
#[inline]
pub fn barrier() {
    compiler_fence(Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barrier_separates_marked_accesses() {
        use crate::AtomicWord;

        let word = AtomicWord::<u32>::new(1);
        word.write_once(2);
        barrier();
        assert_eq!(word.read_once(), 2);
    }
}
