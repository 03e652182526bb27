//! Virtio device support: legacy (v1) MMIO transport, split virtqueue, and
//! the block device driver built on top of both.
//!
//! This kernel speaks to exactly one virtio device — the block device at
//! the QEMU `virt` machine's fixed MMIO window — so unlike a general-purpose
//! virtio stack there is no transport enum or device enumeration here.

pub mod blk;
pub mod mmio;
pub mod queue;
