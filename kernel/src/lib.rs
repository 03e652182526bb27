//! Kernel library.
//!
//! Split the way a bare-metal kernel crate usually is: this library holds
//! every subsystem as a testable module, while `main.rs` is the thin
//! `riscv32imac-unknown-none-elf`-only binary entry point that wires them
//! together at boot. Pure-logic modules (TAR framing, page-table bit
//! packing, virtqueue ring arithmetic, the file table) carry ordinary
//! `#[test]` units that run on the host; the asm trampolines and MMIO
//! register access in `arch`/`process` are meaningful only on the real
//! target.
//!
//! `no_std` is dropped for `cfg(test)` builds so host unit tests get the
//! standard library's test harness and panic-unwinding machinery for free.
#![cfg_attr(not(test), no_std)]

#[macro_use]
pub mod print;

pub mod arch;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fs;
pub mod log_service;
pub mod mm;
pub mod process;
pub mod sync;
pub mod syscall;
