//! Process lifecycle and cooperative scheduling.
//!
//! There is no preemption: a process only stops running when it calls
//! `yield` itself (directly, or indirectly via a blocking syscall like
//! `SYS_GETCHAR`). The scheduler is a round-robin scan of the fixed
//! process table starting just after the current process.

pub mod creation;
pub mod table;

use core::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

pub use creation::create_process;
pub use table::{Process, ProcessState, PROCESS_TABLE};

use crate::arch::riscv::context::switch_context;
use crate::arch::riscv::{satp_sv32, write_satp, write_sscratch};
use crate::config::PROCS_MAX;

/// Index of the currently running process's slot.
static CURRENT: AtomicUsize = AtomicUsize::new(0);
/// pid of the currently running process (mirrors `CURRENT`'s `pid` field
/// for lock-free reads from the trap path).
static CURRENT_PID: AtomicI32 = AtomicI32::new(-1);

pub fn current_pid() -> i32 {
    CURRENT_PID.load(Ordering::Relaxed)
}

pub fn current_slot() -> usize {
    CURRENT.load(Ordering::Relaxed)
}

pub(crate) fn set_current(slot: usize, pid: i32) {
    CURRENT.store(slot, Ordering::Relaxed);
    CURRENT_PID.store(pid, Ordering::Relaxed);
}

pub(crate) fn user_entry_addr() -> usize {
    crate::arch::riscv::context::user_entry as usize
}

/// Switches to the next `Runnable` process after the current one, wrapping
/// around the table; falls back to the idle process if none is runnable.
/// Returns immediately if the current process is the only choice.
pub fn yield_now() {
    let mut table = PROCESS_TABLE.lock();
    let current = CURRENT.load(Ordering::Relaxed);
    let current_pid = table.get(current).pid;

    let mut next = None;
    for i in 0..PROCS_MAX {
        let idx = (current_pid.max(0) as usize + i) % PROCS_MAX;
        let proc = table.get(idx);
        if proc.state == ProcessState::Runnable && proc.pid > 0 {
            next = Some(idx);
            break;
        }
    }
    // Idle process always lives in slot 0 once booted; fall back to it.
    let next = next.unwrap_or(0);

    if next == current {
        return;
    }

    let next_pid = table.get(next).pid;
    set_current(next, next_pid);

    let next_page_table = table.get(next).page_table;
    let satp = satp_sv32(next_page_table as u32 / crate::config::PAGE_SIZE as u32);
    write_satp(satp);
    write_sscratch(table.get(next).stack_top());

    let prev_sp_ptr = core::ptr::addr_of_mut!(table.get_mut(current).sp);
    let next_sp_ptr = core::ptr::addr_of_mut!(table.get_mut(next).sp);

    // Drop the lock before the asm trampoline switches stacks underneath
    // us — it never returns into this stack frame on the first switch of
    // a freshly created process, and on later switches it returns here
    // with the lock already released by the process that switched away.
    drop(table);
    // SAFETY: `prev_sp_ptr`/`next_sp_ptr` point at the `sp` fields of two
    // distinct, live process table entries; the table lock is released
    // above so the asm trampoline is free to switch stacks underneath it.
    unsafe { switch_context(prev_sp_ptr, next_sp_ptr) };
}
