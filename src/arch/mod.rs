//! # Architecture Dispatch
//!
//! Exactly one backend is compiled per build target; the choice is fixed
//! for the lifetime of the binary and costs nothing at run time. Every
//! backend exports the same function surface (mutually exclusive
//! instruction sequences for one operation set), so the rest of the crate
//! is target-agnostic.
//!
//! ## Backends
//!
//! - `x86_64`: total store order; locked instructions for the
//!   read-modify-writes.
//! - `aarch64`: exclusive-pair loops, or single-instruction LSE atomics
//!   under `target_feature = "lse"`; `wfe`-based event wait.
//! - `riscv64`: LR/SC loops, or `amocas` under `target_feature = "zacas"`;
//!   native `amoor` for fetch-or.
//! - `generic`: the toolchain's built-in atomics, for any other target
//!   that has lock-free atomics at all four widths.
//!
//! A target with no backend and without full-width built-in atomics fails
//! the build here. Compiling a non-atomic stand-in instead would plant
//! undetectable data races, so that path does not exist.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub(crate) mod x86_64;
        pub(crate) use self::x86_64 as imp;
    } else if #[cfg(target_arch = "aarch64")] {
        pub(crate) mod aarch64;
        pub(crate) use self::aarch64 as imp;
    } else if #[cfg(target_arch = "riscv64")] {
        pub(crate) mod riscv64;
        pub(crate) use self::riscv64 as imp;
    } else if #[cfg(all(
        target_has_atomic = "8",
        target_has_atomic = "16",
        target_has_atomic = "32",
        target_has_atomic = "64"
    ))] {
        pub(crate) mod generic;
        pub(crate) use self::generic as imp;
    } else {
        compile_error!(
            "no atomic backend for this target: it has no coded instruction \
             sequences and lacks built-in lock-free atomics at widths \
             8/16/32/64"
        );
    }
}
