//! Physical frame allocator.
//!
//! A bump allocator over `[__free_ram, __free_ram_end)`: free memory is
//! only ever handed out, never returned, which matches this kernel's
//! single-shot boot sequence (the idle process and the one user image are
//! both created once).

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::config::PAGE_SIZE;
use crate::error::KernelError;

extern "C" {
    static __free_ram: u8;
    static __free_ram_end: u8;
}

static NEXT_PADDR: AtomicUsize = AtomicUsize::new(0);

fn free_ram_start() -> usize {
    &raw const __free_ram as usize
}

fn free_ram_end() -> usize {
    &raw const __free_ram_end as usize
}

/// Allocates `n` contiguous, zero-filled physical pages. Returns the
/// physical address of the first page.
pub fn alloc_pages(n: usize) -> Result<usize, KernelError> {
    if NEXT_PADDR.load(Ordering::Relaxed) == 0 {
        NEXT_PADDR.store(free_ram_start(), Ordering::Relaxed);
    }

    let size = n * PAGE_SIZE;
    let paddr = NEXT_PADDR.fetch_add(size, Ordering::Relaxed);
    let end = paddr + size;
    if end > free_ram_end() {
        return Err(KernelError::OutOfFrames);
    }

    // SAFETY: `[paddr, paddr + size)` was just reserved by the `fetch_add`
    // above and checked against `free_ram_end()`; no other caller can have
    // been handed an overlapping range.
    unsafe {
        core::ptr::write_bytes(paddr as *mut u8, 0, size);
    }
    Ok(paddr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_requests_are_page_multiples() {
        assert_eq!(PAGE_SIZE, 4096);
    }
}
