//! User entry and cooperative context switch.
//!
//! Both functions are genuinely naked — no compiler-generated prologue can
//! be allowed to touch `sp` before these bodies run, since both choreograph
//! a privilege or stack transition by hand.

use core::arch::naked_asm;

use crate::config::USER_BASE;

const SSTATUS_SPIE: u32 = 1 << 5;
const SSTATUS_SUM: u32 = 1 << 18;

/// Switches from the trap/boot context into a user image at `USER_BASE`.
///
/// Never returns: `sret` hands control to user mode.
///
/// # Safety
/// Must be reached only as the `ra` a freshly created process resumes into
/// via `switch_context` — it is entered by `ret`, not `call`, so it cannot
/// take its target address as an argument and instead hardcodes
/// `USER_BASE`, which the caller must have already mapped as the process's
/// entry point.
#[unsafe(naked)]
pub unsafe extern "C" fn user_entry() -> ! {
    naked_asm!(
        "li t0, {user_base}",
        "csrw sepc, t0",
        "li t0, {sstatus}",
        "csrw sstatus, t0",
        "sret",
        user_base = const USER_BASE,
        sstatus = const (SSTATUS_SPIE | SSTATUS_SUM),
    );
}

/// Cooperative context switch: saves the callee-saved registers of the
/// outgoing process onto its own stack, stores the resulting `sp` through
/// `prev_sp`, then loads `next_sp` and restores its registers before
/// returning — into whatever `ra` that stack had saved, which for a
/// freshly created process is [`user_entry`].
///
/// # Safety
/// `prev_sp` and `next_sp` must each point at the `sp` field of a distinct,
/// live process table entry; `next_sp` must hold either a stack primed by
/// `create_process` or one previously saved by this same function.
#[unsafe(naked)]
pub unsafe extern "C" fn switch_context(prev_sp: *mut u32, next_sp: *mut u32) {
    naked_asm!(
        "addi sp, sp, -13 * 4",
        "sw ra,  0  * 4(sp)",
        "sw s0,  1  * 4(sp)",
        "sw s1,  2  * 4(sp)",
        "sw s2,  3  * 4(sp)",
        "sw s3,  4  * 4(sp)",
        "sw s4,  5  * 4(sp)",
        "sw s5,  6  * 4(sp)",
        "sw s6,  7  * 4(sp)",
        "sw s7,  8  * 4(sp)",
        "sw s8,  9  * 4(sp)",
        "sw s9,  10 * 4(sp)",
        "sw s10, 11 * 4(sp)",
        "sw s11, 12 * 4(sp)",
        "sw sp, (a0)",
        "lw sp, (a1)",
        "lw ra,  0  * 4(sp)",
        "lw s0,  1  * 4(sp)",
        "lw s1,  2  * 4(sp)",
        "lw s2,  3  * 4(sp)",
        "lw s3,  4  * 4(sp)",
        "lw s4,  5  * 4(sp)",
        "lw s5,  6  * 4(sp)",
        "lw s6,  7  * 4(sp)",
        "lw s7,  8  * 4(sp)",
        "lw s8,  9  * 4(sp)",
        "lw s9,  10 * 4(sp)",
        "lw s10, 11 * 4(sp)",
        "lw s11, 12 * 4(sp)",
        "addi sp, sp, 13 * 4",
        "ret",
    );
}
