//! The fixed-size process table.
//!
//! `PROCS_MAX` processes, no heap, no dynamic growth: a fixed array sized
//! once at compile time.

use spin::Mutex;

use crate::config::{KERNEL_STACK_SIZE, PROCS_MAX};
use crate::error::KernelError;
use crate::mm::PageTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Unused,
    Runnable,
    Exited,
}

/// One process: a kernel stack, a saved stack pointer for context switch,
/// and a pointer to its root page table.
///
/// `pid == -1` marks the idle process; all other live processes have
/// `pid == slot_index + 1`.
pub struct Process {
    pub pid: i32,
    pub state: ProcessState,
    /// Saved kernel stack pointer, valid only while not the running process.
    pub sp: u32,
    pub page_table: *mut PageTable,
    pub stack: [u8; KERNEL_STACK_SIZE],
}

impl Process {
    const fn unused() -> Self {
        Self {
            pid: 0,
            state: ProcessState::Unused,
            sp: 0,
            page_table: core::ptr::null_mut(),
            stack: [0; KERNEL_STACK_SIZE],
        }
    }

    pub fn stack_top(&self) -> u32 {
        (self.stack.as_ptr() as u32).wrapping_add(KERNEL_STACK_SIZE as u32)
    }
}

// SAFETY: the kernel is single-hart and cooperative; `Process` is only ever
// touched while holding `PROCESS_TABLE`'s lock.
unsafe impl Send for Process {}

pub struct ProcessTable {
    procs: [Process; PROCS_MAX],
}

impl ProcessTable {
    const fn new() -> Self {
        // `Process` isn't `Copy`, so build the array with an explicit loop-free
        // const initializer.
        Self {
            procs: [
                Process::unused(),
                Process::unused(),
                Process::unused(),
                Process::unused(),
                Process::unused(),
                Process::unused(),
                Process::unused(),
                Process::unused(),
            ],
        }
    }

    /// Finds a free slot and returns its index, without yet marking it used.
    pub fn find_free_slot(&self) -> Result<usize, KernelError> {
        self.procs
            .iter()
            .position(|p| p.state == ProcessState::Unused)
            .ok_or(KernelError::NoFreeProcessSlot)
    }

    pub fn get(&self, index: usize) -> &Process {
        &self.procs[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Process {
        &mut self.procs[index]
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

pub static PROCESS_TABLE: Mutex<ProcessTable> = Mutex::new(ProcessTable::new());

const _: () = assert!(PROCS_MAX == 8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_has_all_slots_free() {
        let table = ProcessTable::new();
        assert_eq!(table.find_free_slot(), Ok(0));
    }

    #[test]
    fn exhausted_table_reports_no_free_slot() {
        let mut table = ProcessTable::new();
        for i in 0..table.len() {
            table.get_mut(i).state = ProcessState::Runnable;
        }
        assert_eq!(table.find_free_slot(), Err(KernelError::NoFreeProcessSlot));
    }
}
