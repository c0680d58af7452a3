//! # atomic-word
//!
//! Architecture-tuned atomic memory operations for lock-free and blocking
//! synchronization code: single-copy reads and writes, acquire/release
//! accessors, a 32-bit compare-and-swap family, fetch-or, a 16-bit
//! exchange, and conditional spin-wait loops with a low-power event-wait
//! path where the hardware offers one.
//!
//! The operation set is small and its ordering contracts are exact; each
//! operation compiles to a known instruction sequence per target. One backend is selected at build
//! time: there is no runtime dispatch, no allocation, and no operation
//! that can fail once compiled.
//!
//! ## Module Organization
//!
//! - [`AtomicWord`]: the caller-owned 1/2/4/8-byte location and every
//!   operation on it.
//! - [`Word`]: the sealed width marker (`u8`/`u16`/`u32`/`u64`).
//! - [`barrier()`]: the compiler-only fence.
//! - [`cpu_relax()`]: the busy-wait pipeline hint.
//! - [`cycles()`]: the raw hardware tick (coded backends only).
//! - `arch`: per-target instruction sequences for x86_64, aarch64
//!   (LL/SC and LSE), riscv64 (LR/SC and Zacas), and a built-in-atomics
//!   fallback for everything else.
//!
//! ## Example
//!
//! ```
//! use atomic_word::AtomicWord;
//!
//! static STATE: AtomicWord<u32> = AtomicWord::<u32>::new(0);
//!
//! // One writer claims the word...
//! let prev = STATE.cmpxchg_acquire(0, 1);
//! assert_eq!(prev, 0);
//!
//! // ...publishes its work, and a reader that sees the published value
//! // also sees everything written before it.
//! STATE.store_release(2);
//! assert_eq!(STATE.cond_load_acquire(|v| v >= 2), 2);
//! ```

#![cfg_attr(not(test), no_std)]

// ============================================================================
// ARCHITECTURE DISPATCH
// ============================================================================

mod arch;

// ============================================================================
// OPERATION SURFACE
// ============================================================================

mod atomic;
mod barrier;
mod spinwait;
mod word;

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "riscv64"))]
mod cycles;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use atomic::AtomicWord;
pub use barrier::barrier;
pub use spinwait::cpu_relax;
pub use word::Word;

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "riscv64"))]
pub use cycles::cycles;
