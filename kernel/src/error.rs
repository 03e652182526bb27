//! Kernel error taxonomy.
//!
//! Mirrors the two-tier model: recoverable conditions are named here and
//! returned as `Result<_, KernelError>`; anything else is a `panic!` that
//! halts the hart (see [`crate::kernel_panic`]).

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "kernel errors must be handled, not silently discarded"]
pub enum KernelError {
    /// The process table has no free slot (`PROCS_MAX` exceeded).
    NoFreeProcessSlot,
    /// `FileTable::lookup` found no file by this name.
    FileNotFound,
    /// A requested disk sector lies outside the backing image.
    SectorOutOfRange { sector: u32, capacity: u32 },
    /// The virtio device reported a non-OK status for a request.
    VirtioStatus { code: u8 },
    /// The virtio-mmio device at the expected address failed probing
    /// (bad magic, version, or device id).
    VirtioDeviceNotFound,
    /// A physical frame request exceeded the free memory region.
    OutOfFrames,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::NoFreeProcessSlot => write!(f, "no free process slot"),
            KernelError::FileNotFound => write!(f, "file not found"),
            KernelError::SectorOutOfRange { sector, capacity } => {
                write!(f, "sector {sector} out of range (capacity {capacity})")
            }
            KernelError::VirtioStatus { code } => write!(f, "virtio request failed, status {code}"),
            KernelError::VirtioDeviceNotFound => write!(f, "virtio-blk device not found"),
            KernelError::OutOfFrames => write!(f, "out of physical frames"),
        }
    }
}

/// Prints a formatted message through the kernel logger and halts the hart.
///
/// Unlike `panic!`, this is the single chosen fatal path so every halt
/// goes through the same console/log sink, with the file and line of the
/// failing check attached.
#[macro_export]
macro_rules! kernel_panic {
    ($($arg:tt)*) => {{
        log::error!("PANIC: {}:{}: {}", file!(), line!(), format_args!($($arg)*));
        #[allow(clippy::empty_loop)]
        loop {
            core::hint::spin_loop();
        }
    }};
}
