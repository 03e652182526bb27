//! Global-state primitives.
//!
//! The process table, file table, frame allocator frontier, and virtio
//! queue are each `static` values behind one of these wrappers so that no
//! subsystem reaches for a bare `static mut`.

pub mod once_lock;

pub use once_lock::OnceCell;
