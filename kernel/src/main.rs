//! Bare-metal entry point. Built only for `riscv32imac-unknown-none-elf`;
//! everything else lives in the library crate so it stays host-testable.
#![no_std]
#![no_main]

use core::panic::PanicInfo;

use riscv32_kernel::arch::riscv::trap;
// Referencing `boot` keeps it from being dropped by the linker even though
// nothing in Rust calls it directly — the linker script's `ENTRY(boot)`
// is what firmware actually jumps to.
use riscv32_kernel::arch::riscv::boot::boot as _boot_entry;
use riscv32_kernel::{config, drivers, fs, kernel_panic, log_service, process};

extern "C" {
    static __bss: u8;
    static __bss_end: u8;
    static _binary_shell_bin_start: u8;
    static _binary_shell_bin_size: u8;
}

fn zero_bss() {
    // SAFETY: `__bss`/`__bss_end` bound the linker-provided BSS region;
    // nothing has run yet that could depend on its prior contents.
    unsafe {
        let start = &raw const __bss as *const u8 as usize;
        let end = &raw const __bss_end as *const u8 as usize;
        core::ptr::write_bytes(start as *mut u8, 0, end - start);
    }
}

fn embedded_shell_image() -> &'static [u8] {
    // SAFETY: the linker places the shell binary at `_binary_shell_bin_start`
    // with `_binary_shell_bin_size` bytes; both symbols come from the build
    // (`build.rs` embeds `user/shell` as an object and the linker script
    // places its section here).
    unsafe {
        let start = &raw const _binary_shell_bin_start as *const u8;
        let size = &raw const _binary_shell_bin_size as *const u8 as usize;
        core::slice::from_raw_parts(start, size)
    }
}

#[no_mangle]
pub extern "C" fn kernel_main() -> ! {
    zero_bss();
    log_service::init(log::LevelFilter::Info);
    log::info!("booting ({} process slots, {} file slots)", config::PROCS_MAX, config::FILES_MAX);

    trap::install();

    if let Err(err) = drivers::virtio::blk::init() {
        kernel_panic!("virtio-blk init failed: {err}");
    }
    if let Err(err) = fs::init() {
        kernel_panic!("file table init failed: {err}");
    }

    // The idle process always lands in process-table slot 0 (the first
    // free slot in a fresh table), which matches `process::current_slot()`
    // and `process::current_pid()`'s default values (0, -1) — no explicit
    // "current = idle" bookkeeping is needed.
    if let Err(err) = process::create_process(&[]) {
        kernel_panic!("idle process creation failed: {err}");
    }
    if let Err(err) = process::create_process(embedded_shell_image()) {
        kernel_panic!("shell process creation failed: {err}");
    }

    process::yield_now();

    // Reachable only once every other process has exited and control has
    // switched back into the idle process's one saved continuation, which
    // is this exact point right after the `yield_now` above.
    kernel_panic!("switched to idle process");
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    log::error!("PANIC: {info}");
    loop {
        core::hint::spin_loop();
    }
}
