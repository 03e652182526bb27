//! Device drivers. The only device this kernel talks to is the virtio-mmio
//! block device; there is no bus to probe and no driver registry, since the
//! device's address is fixed by the platform.

pub mod virtio;
