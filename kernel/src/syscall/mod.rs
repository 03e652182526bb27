//! Syscall dispatch — the kernel's side of the user-kernel ABI.
//!
//! Called from [`crate::arch::riscv::trap::handle_trap`] with the syscall
//! number in `a3` and arguments in `a0..a2`; the return value goes back
//! in `a0`.

use crate::arch::riscv::sbi;
use crate::arch::riscv::trap::TrapFrame;
use crate::config::FILE_DATA_SIZE;
use crate::fs;
use crate::process;
use crate::process::table::{ProcessState, PROCESS_TABLE};

const SYS_PUTCHAR: u32 = 1;
const SYS_GETCHAR: u32 = 2;
const SYS_EXIT: u32 = 3;
const SYS_READFILE: u32 = 4;
const SYS_WRITEFILE: u32 = 5;

/// Reads a NUL-terminated string out of user memory at `ptr`. User and
/// kernel run under the same page table (every process's Sv32 root maps the
/// kernel identically, see `process::creation::create_process`), so this is
/// a direct dereference rather than a cross-address-space copy. The kernel
/// does not validate the pointer; a bad one faults into a fatal trap, per
/// this kernel's accepted simplification.
///
/// # Safety
///
/// `ptr` must point at memory mapped readable for at least `max_len` bytes
/// or contain a NUL within that span, under the page table active when this
/// is called.
unsafe fn read_user_cstr(ptr: u32, max_len: usize) -> &'static str {
    let base = ptr as *const u8;
    let mut len = 0;
    // SAFETY: caller guarantees `base` is readable up to `max_len`, or a
    // NUL terminates the string before that bound is reached.
    while len < max_len && unsafe { *base.add(len) } != 0 {
        len += 1;
    }
    // SAFETY: `len` bytes starting at `base` were just read one at a time
    // above without fault.
    let bytes = unsafe { core::slice::from_raw_parts(base, len) };
    core::str::from_utf8(bytes).unwrap_or("")
}

pub fn handle_syscall(frame: &mut TrapFrame) {
    match frame.a3 {
        SYS_PUTCHAR => sbi::console_putchar(frame.a0 as u8),
        SYS_GETCHAR => handle_getchar(frame),
        SYS_EXIT => handle_exit(),
        SYS_READFILE => handle_readfile(frame),
        SYS_WRITEFILE => handle_writefile(frame),
        other => crate::kernel_panic!("unknown syscall number {}", other),
    }
}

/// Busy-waits for a console byte, yielding to the next runnable process on
/// every empty poll. This is the only path by which the kernel voluntarily
/// reschedules from inside a syscall.
fn handle_getchar(frame: &mut TrapFrame) {
    loop {
        let ch = sbi::console_getchar();
        if ch >= 0 {
            frame.a0 = ch as u32;
            return;
        }
        process::yield_now();
    }
}

fn handle_exit() {
    let slot = process::current_slot();
    log::info!("process {} exited", process::current_pid());
    PROCESS_TABLE.lock().get_mut(slot).state = ProcessState::Exited;
    process::yield_now();
    crate::kernel_panic!("unreachable: exited process resumed");
}

fn handle_readfile(frame: &mut TrapFrame) {
    // SAFETY: `frame.a0` is a user-supplied pointer to a NUL-terminated name
    // under the current (identity-mapping-kernel) page table; a bad pointer
    // faults into a fatal trap rather than reading foreign memory.
    let name = unsafe { read_user_cstr(frame.a0, 100) };
    let buf = frame.a1 as *mut u8;
    let len = frame.a2 as usize;

    let table = fs::FILE_TABLE.lock();
    let slot = match table.lookup(name) {
        Ok(slot) => slot,
        Err(err) => {
            log::warn!("readfile \"{name}\": {err}");
            frame.a0 = -1i32 as u32;
            return;
        }
    };

    let file = table.file(slot);
    // Clamp unconditionally to the file's real size: a `len` that fits the
    // slot but exceeds `size` must not read uninitialized slot bytes.
    let copy_len = len.min(file.size());
    // SAFETY: `buf` is the user's destination buffer, trusted the same way
    // as the name pointer above; `copy_len` is bounded by the file's actual
    // size, so the read side never runs past `file.data()`.
    unsafe {
        core::ptr::copy_nonoverlapping(file.data().as_ptr(), buf, copy_len);
    }
    frame.a0 = copy_len as u32;
}

fn handle_writefile(frame: &mut TrapFrame) {
    // SAFETY: see `handle_readfile` — same user-pointer contract.
    let name = unsafe { read_user_cstr(frame.a0, 100) };
    let buf = frame.a1 as *const u8;
    let len = frame.a2 as usize;

    let mut table = fs::FILE_TABLE.lock();
    let slot = match table.lookup(name) {
        Ok(slot) => slot,
        Err(err) => {
            log::warn!("writefile \"{name}\": {err}");
            frame.a0 = -1i32 as u32;
            return;
        }
    };

    let copy_len = len.min(FILE_DATA_SIZE);
    // SAFETY: `buf` is the user's source buffer, trusted the same way as
    // the name pointer; `copy_len` is clamped to `FILE_DATA_SIZE` before
    // the slice is formed.
    let data = unsafe { core::slice::from_raw_parts(buf, copy_len) };
    let written = table.file_mut(slot).set_data(data);
    drop(table);

    if let Err(err) = fs::flush() {
        log::warn!("fs flush after writefile failed: {err}");
    }
    frame.a0 = written as u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syscall_numbers_match_abi() {
        assert_eq!(SYS_PUTCHAR, 1);
        assert_eq!(SYS_GETCHAR, 2);
        assert_eq!(SYS_EXIT, 3);
        assert_eq!(SYS_READFILE, 4);
        assert_eq!(SYS_WRITEFILE, 5);
    }
}
