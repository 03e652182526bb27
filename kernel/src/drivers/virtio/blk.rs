//! Legacy virtio-mmio block device driver.
//!
//! One device, one queue, one in-flight request: the kernel never issues a
//! second disk I/O before the first completes, so the driver keeps a single
//! shared [`VirtioBlkReq`] buffer and a single shared queue rather than
//! pooling either.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::config::{PAGE_SIZE, SECTOR_SIZE, VIRTIO_DEVICE_BLK, VIRTQ_ENTRY_NUM};
use crate::drivers::virtio::mmio::{regs, status, MmioTransport, MAGIC_VALUE};
use crate::drivers::virtio::queue::{VirtioVirtq, VIRTQ_DESC_F_NEXT, VIRTQ_DESC_F_WRITE};
use crate::error::KernelError;
use crate::mm;
use crate::sync::OnceCell;

const VIRTIO_BLK_T_IN: u32 = 0;
const VIRTIO_BLK_T_OUT: u32 = 1;

/// The one request buffer shared by every disk access: header, 512-byte
/// sector payload, and device-written status byte, packed so a descriptor
/// can point straight at any one field.
#[repr(C, packed)]
struct VirtioBlkReq {
    type_: u32,
    reserved: u32,
    sector: u64,
    data: [u8; SECTOR_SIZE],
    status: u8,
}

struct BlkDevice {
    transport: MmioTransport,
    queue: *mut VirtioVirtq,
    req: *mut VirtioBlkReq,
}

// SAFETY: the kernel is single-hart and cooperative; the device is only
// touched from `read_write_disk`, never concurrently.
unsafe impl Send for BlkDevice {}
// SAFETY: same as `Send` above — single-hart, cooperative, never aliased
// concurrently.
unsafe impl Sync for BlkDevice {}

static BLK: OnceCell<BlkDevice> = OnceCell::new();
static CAPACITY_SECTORS: AtomicU64 = AtomicU64::new(0);

/// Runs the legacy virtio-mmio probe + init sequence and allocates the
/// queue and shared request buffer.
pub fn init() -> Result<(), KernelError> {
    let transport = MmioTransport::blk();

    // SAFETY: `VIRTIO_BLK_PADDR` is mapped 1:1 and reserved for this device
    // by every process's page table (see `process::creation::create_process`).
    unsafe {
        if transport.read32(regs::MAGIC) != MAGIC_VALUE
            || transport.read32(regs::VERSION) != 1
            || transport.read32(regs::DEVICE_ID) != VIRTIO_DEVICE_BLK
        {
            return Err(KernelError::VirtioDeviceNotFound);
        }

        transport.write32(regs::DEVICE_STATUS, 0);
        transport.fetch_or32(regs::DEVICE_STATUS, status::ACK);
        transport.fetch_or32(regs::DEVICE_STATUS, status::DRIVER);
        transport.fetch_or32(regs::DEVICE_STATUS, status::FEATURES_OK);

        transport.write32(regs::QUEUE_SEL, 0);
        let queue_num_max = transport.read32(regs::QUEUE_NUM_MAX);
        if queue_num_max == 0 || (queue_num_max as usize) < VIRTQ_ENTRY_NUM {
            return Err(KernelError::VirtioDeviceNotFound);
        }

        let queue_paddr = mm::alloc_pages(virtq_pages())?;
        let queue = queue_paddr as *mut VirtioVirtq;
        transport.write32(regs::QUEUE_NUM, VIRTQ_ENTRY_NUM as u32);
        transport.write32(regs::QUEUE_ALIGN, 0);
        transport.write32(regs::QUEUE_PFN, (queue_paddr / PAGE_SIZE) as u32);

        transport.fetch_or32(regs::DEVICE_STATUS, status::DRIVER_OK);

        let capacity_sectors = transport.read64(regs::DEVICE_CONFIG);
        CAPACITY_SECTORS.store(capacity_sectors, Ordering::Relaxed);

        let req_paddr = mm::alloc_pages(1)?;
        BLK.init(BlkDevice {
            transport,
            queue,
            req: req_paddr as *mut VirtioBlkReq,
        });
    }

    log::info!(
        "virtio-blk: capacity {} sectors ({} KiB)",
        CAPACITY_SECTORS.load(Ordering::Relaxed),
        CAPACITY_SECTORS.load(Ordering::Relaxed) * SECTOR_SIZE as u64 / 1024,
    );
    Ok(())
}

const fn virtq_pages() -> usize {
    (core::mem::size_of::<VirtioVirtq>() + PAGE_SIZE - 1) / PAGE_SIZE
}

/// Synchronously reads or writes one 512-byte sector, busy-waiting for the
/// device to complete the single outstanding request.
pub fn read_write_disk(buf: &mut [u8; SECTOR_SIZE], sector: u32, is_write: bool) -> Result<(), KernelError> {
    let capacity = CAPACITY_SECTORS.load(Ordering::Relaxed);
    if sector as u64 >= capacity {
        return Err(KernelError::SectorOutOfRange {
            sector,
            capacity: capacity as u32,
        });
    }

    BLK.with(|dev| {
        // SAFETY: `dev.req` and `dev.queue` were allocated by `init` and are
        // never aliased outside this single-threaded, cooperative driver.
        unsafe {
            let req = &mut *dev.req;
            req.type_ = if is_write { VIRTIO_BLK_T_OUT } else { VIRTIO_BLK_T_IN };
            req.reserved = 0;
            req.sector = sector as u64;
            if is_write {
                req.data.copy_from_slice(buf);
            }
            req.status = 0xff;

            let req_paddr = dev.req as usize as u64;
            let header_len = core::mem::offset_of!(VirtioBlkReq, data) as u32;
            let data_paddr = req_paddr + header_len as u64;
            let status_paddr = req_paddr + core::mem::offset_of!(VirtioBlkReq, status) as u64;

            let queue = &mut *dev.queue;
            queue.descs[0].addr = req_paddr;
            queue.descs[0].len = header_len;
            queue.descs[0].flags = VIRTQ_DESC_F_NEXT;
            queue.descs[0].next = 1;

            queue.descs[1].addr = data_paddr;
            queue.descs[1].len = SECTOR_SIZE as u32;
            queue.descs[1].flags = if is_write {
                VIRTQ_DESC_F_NEXT
            } else {
                VIRTQ_DESC_F_NEXT | VIRTQ_DESC_F_WRITE
            };
            queue.descs[1].next = 2;

            queue.descs[2].addr = status_paddr;
            queue.descs[2].len = 1;
            queue.descs[2].flags = VIRTQ_DESC_F_WRITE;
            queue.descs[2].next = 0;

            queue.push_available(0);
            dev.transport.notify_queue(0);
            queue.mark_kicked();
            while queue.is_busy() {
                core::hint::spin_loop();
            }

            if req.status != 0 {
                return Err(KernelError::VirtioStatus { code: req.status });
            }
            if !is_write {
                buf.copy_from_slice(&req.data);
            }
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_layout_matches_legacy_protocol() {
        assert_eq!(core::mem::offset_of!(VirtioBlkReq, type_), 0);
        assert_eq!(core::mem::offset_of!(VirtioBlkReq, sector), 8);
        assert_eq!(core::mem::offset_of!(VirtioBlkReq, data), 16);
    }

    #[test]
    fn virtq_fits_within_a_handful_of_pages() {
        assert!(virtq_pages() >= 1);
        assert!(virtq_pages() * PAGE_SIZE >= core::mem::size_of::<VirtioVirtq>());
    }
}
