//! Boot smoke test: runs the real boot sequence (trap install, virtio-blk
//! init, file table init, idle process creation) under QEMU and logs a
//! marker the console carries out. No harness runner: this binary has its
//! own `#[no_mangle] kernel_main` entry, like `src/main.rs`.

#![no_std]
#![no_main]

use core::panic::PanicInfo;

use riscv32_kernel::arch::riscv::boot::boot as _boot_entry;
use riscv32_kernel::arch::riscv::trap;
use riscv32_kernel::{config, drivers, fs, kernel_panic, log_service, process};

extern "C" {
    static __bss: u8;
    static __bss_end: u8;
}

fn zero_bss() {
    // SAFETY: `__bss`/`__bss_end` bound the linker-provided bss region; no
    // other code has run yet, so nothing aliases it.
    unsafe {
        let start = &__bss as *const u8 as *mut u8;
        let end = &__bss_end as *const u8 as usize;
        let len = end - start as usize;
        core::ptr::write_bytes(start, 0, len);
    }
}

#[no_mangle]
pub extern "C" fn kernel_main() -> ! {
    zero_bss();
    log_service::init(log::LevelFilter::Info);
    trap::install();

    if let Err(err) = drivers::virtio::blk::init() {
        kernel_panic!("virtio-blk init failed: {err}");
    }
    if let Err(err) = fs::init() {
        kernel_panic!("file table init failed: {err}");
    }
    if let Err(err) = process::create_process(&[]) {
        kernel_panic!("idle process creation failed: {err}");
    }

    log::info!(
        "BASIC_BOOT_OK procs_max={} files_max={}",
        config::PROCS_MAX,
        config::FILES_MAX
    );

    loop {
        core::hint::spin_loop();
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    log::error!("PANIC: {info}");
    loop {
        core::hint::spin_loop();
    }
}
