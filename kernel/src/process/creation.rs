//! Process creation: kernel stack priming and the three-region page table
//! (kernel identity map, virtio-blk MMIO window, user image).

use crate::config::{PAGE_SIZE, USER_BASE, VIRTIO_BLK_PADDR};
use crate::error::KernelError;
use crate::mm::{self, PageTable, PAGE_R, PAGE_U, PAGE_W, PAGE_X};
use crate::process::table::{Process, ProcessState, PROCESS_TABLE};

use super::user_entry_addr;

extern "C" {
    static __kernel_base: u8;
    static __free_ram_end: u8;
}

/// Creates a process running `image` (copied page-by-page to fresh
/// frames at `USER_BASE`), or the idle process when `image` is empty.
///
/// Returns the new process's slot index, 0-based, matching the array
/// position the caller can later compare `current` against.
pub fn create_process(image: &[u8]) -> Result<usize, KernelError> {
    let mut table = PROCESS_TABLE.lock();
    let slot = table.find_free_slot()?;

    // Prime the kernel stack so the first `switch_context` pops straight
    // into `user_entry`, with every callee-saved register zeroed.
    {
        let proc = table.get_mut(slot);
        let top = proc.stack_top();
        let mut sp = top;
        let mut push = |value: u32| {
            sp -= 4;
            // SAFETY: `sp` steps down from `top`, the freshly allocated
            // kernel stack's top, by 4 bytes on each call and never passes
            // the stack's base within this loop.
            unsafe { core::ptr::write(sp as *mut u32, value) };
        };
        for _ in 0..12 {
            push(0); // s11..s0
        }
        push(user_entry_addr() as u32); // ra
        proc.sp = sp;
    }

    let page_table_paddr = mm::alloc_pages(1)? as *mut PageTable;

    let kernel_base = &raw const __kernel_base as usize as u32;
    let free_ram_end = &raw const __free_ram_end as usize as u32;
    let mut paddr = kernel_base;
    while paddr < free_ram_end {
        // SAFETY: `page_table_paddr` is a fresh, page-aligned frame from
        // `alloc_pages`, and `paddr` walks page-aligned steps across the
        // kernel's own linked image and free-RAM region.
        unsafe { mm::map_page(page_table_paddr, paddr, paddr, PAGE_R | PAGE_W | PAGE_X)? };
        paddr += PAGE_SIZE as u32;
    }

    // SAFETY: `VIRTIO_BLK_PADDR` is a fixed, page-aligned MMIO address on
    // the `virt` machine; `page_table_paddr` is the same fresh frame as
    // above.
    unsafe {
        mm::map_page(
            page_table_paddr,
            VIRTIO_BLK_PADDR as u32,
            VIRTIO_BLK_PADDR as u32,
            PAGE_R | PAGE_W,
        )?
    };

    let mut off = 0u32;
    while (off as usize) < image.len() {
        let page = mm::alloc_pages(1)? as u32;
        let remaining = image.len() - off as usize;
        let copy_size = core::cmp::min(PAGE_SIZE, remaining);
        // SAFETY: `page` is a fresh frame exclusively owned by this loop
        // iteration, `copy_size` never exceeds one page, and `image` is a
        // borrowed slice at least `off + copy_size` bytes long.
        unsafe {
            core::ptr::copy_nonoverlapping(
                image.as_ptr().add(off as usize),
                page as *mut u8,
                copy_size,
            );
            mm::map_page(
                page_table_paddr,
                USER_BASE + off,
                page,
                PAGE_U | PAGE_R | PAGE_W | PAGE_X,
            )?;
        }
        off += PAGE_SIZE as u32;
    }

    let proc = table.get_mut(slot);
    proc.pid = if image.is_empty() { -1 } else { slot as i32 + 1 };
    proc.state = ProcessState::Runnable;
    proc.page_table = page_table_paddr;
    Ok(slot)
}

impl Process {
    /// `true` for the idle process created with an empty image.
    pub fn is_idle(&self) -> bool {
        self.pid < 0
    }
}
