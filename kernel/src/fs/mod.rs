//! The flat, fixed-size file table and its USTAR-on-disk representation.
//!
//! `FILES_MAX` files live in memory at all times once `init` has loaded
//! them; there is no open/close and no directory structure — just a flat
//! array of fixed-size slots.

pub mod tar;

use spin::Mutex;

use crate::config::{align_up, DISK_MAX_SIZE, FILES_MAX, FILE_DATA_SIZE, SECTOR_SIZE};
use crate::drivers::virtio::blk;
use crate::error::KernelError;

const _: () = assert!(DISK_MAX_SIZE >= FILES_MAX * align_up(tar::HEADER_SIZE + FILE_DATA_SIZE, SECTOR_SIZE));

pub struct File {
    in_use: bool,
    name: [u8; 100],
    name_len: usize,
    data: [u8; FILE_DATA_SIZE],
    size: usize,
}

impl File {
    const fn empty() -> Self {
        Self {
            in_use: false,
            name: [0; 100],
            name_len: 0,
            data: [0; FILE_DATA_SIZE],
            size: 0,
        }
    }

    pub fn name(&self) -> &str {
        core::str::from_utf8(&self.name[..self.name_len]).unwrap_or("")
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.size]
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Overwrites the file's contents, clamped to the fixed data slot —
    /// never writes past `FILE_DATA_SIZE` (see DESIGN.md for why this
    /// clamps unconditionally rather than only when `len` overflows the
    /// buffer).
    pub fn set_data(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.data.len());
        self.data[..len].copy_from_slice(&data[..len]);
        self.size = len;
        len
    }
}

pub struct FileTable {
    files: [File; FILES_MAX],
}

impl FileTable {
    const fn new() -> Self {
        Self {
            files: [File::empty(), File::empty()],
        }
    }

    pub fn lookup(&self, name: &str) -> Result<usize, KernelError> {
        self.files
            .iter()
            .position(|f| f.in_use && f.name() == name)
            .ok_or(KernelError::FileNotFound)
    }

    pub fn file(&self, slot: usize) -> &File {
        &self.files[slot]
    }

    pub fn file_mut(&mut self, slot: usize) -> &mut File {
        &mut self.files[slot]
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = assert!(FILES_MAX == 2);

pub static FILE_TABLE: Mutex<FileTable> = Mutex::new(FileTable::new());

fn read_disk_image() -> Result<[u8; DISK_MAX_SIZE], KernelError> {
    let mut disk = [0u8; DISK_MAX_SIZE];
    for i in 0..(DISK_MAX_SIZE / SECTOR_SIZE) {
        let mut sector = [0u8; SECTOR_SIZE];
        blk::read_write_disk(&mut sector, i as u32, false)?;
        disk[i * SECTOR_SIZE..(i + 1) * SECTOR_SIZE].copy_from_slice(&sector);
    }
    Ok(disk)
}

/// Loads the file table from the TAR stream on disk. An unparsable header
/// (the zero-name end marker, or we've run off the end of the image) stops
/// loading; later slots stay unused. Entries are walked at their real
/// offsets — header immediately followed by data, padded up to the next
/// sector boundary — exactly like a true USTAR stream, not a fixed stride
/// per slot, so the image `fs_flush` writes stays readable by an external
/// `tar` that doesn't know about this file table's slot count.
pub fn init() -> Result<(), KernelError> {
    let disk = read_disk_image()?;
    let mut table = FILE_TABLE.lock();

    let mut cursor = 0usize;
    for slot in 0..FILES_MAX {
        if cursor + tar::HEADER_SIZE > DISK_MAX_SIZE {
            break;
        }
        let header: &[u8; tar::HEADER_SIZE] = disk[cursor..cursor + tar::HEADER_SIZE]
            .try_into()
            .expect("bounds checked above");
        let Some((name, size)) = tar::parse_header(header) else {
            break;
        };

        let data_off = cursor + tar::HEADER_SIZE;
        let copy_len = (size as usize).min(FILE_DATA_SIZE);

        let file = table.file_mut(slot);
        let name_bytes = name.as_bytes();
        let name_len = name_bytes.len().min(file.name.len());
        file.name[..name_len].copy_from_slice(&name_bytes[..name_len]);
        file.name_len = name_len;
        file.data[..copy_len].copy_from_slice(&disk[data_off..data_off + copy_len]);
        file.size = copy_len;
        file.in_use = true;

        log::info!("fs: loaded \"{}\" ({} bytes)", file.name(), file.size());

        cursor = align_up(data_off + size as usize, SECTOR_SIZE);
    }

    Ok(())
}

/// Serializes every in-use file as a USTAR header + data record, packed
/// back-to-back and sector-padded like a real TAR stream, and writes the
/// whole disk image back, sector by sector.
pub fn flush() -> Result<(), KernelError> {
    let mut disk = [0u8; DISK_MAX_SIZE];
    {
        let table = FILE_TABLE.lock();
        let mut cursor = 0usize;
        for slot in 0..FILES_MAX {
            let file = table.file(slot);
            if !file.in_use {
                continue;
            }
            let header: &mut [u8; tar::HEADER_SIZE] = (&mut disk[cursor..cursor + tar::HEADER_SIZE])
                .try_into()
                .expect("disk budget reserves room for every file's worst case");
            tar::write_header(header, file.name().as_bytes(), file.size() as u32);

            let data_off = cursor + tar::HEADER_SIZE;
            disk[data_off..data_off + file.size()].copy_from_slice(file.data());

            cursor = align_up(data_off + file.size(), SECTOR_SIZE);
        }
    }

    for i in 0..(DISK_MAX_SIZE / SECTOR_SIZE) {
        let mut sector = [0u8; SECTOR_SIZE];
        sector.copy_from_slice(&disk[i * SECTOR_SIZE..(i + 1) * SECTOR_SIZE]);
        blk::read_write_disk(&mut sector, i as u32, true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_budget_fits_every_file_at_worst_case_size() {
        let per_file = align_up(tar::HEADER_SIZE + FILE_DATA_SIZE, SECTOR_SIZE);
        assert!(FILES_MAX * per_file <= DISK_MAX_SIZE);
    }

    #[test]
    fn fresh_table_has_no_files() {
        let table = FileTable::new();
        assert_eq!(table.lookup("anything"), Err(KernelError::FileNotFound));
    }

    #[test]
    fn set_data_clamps_to_slot_size() {
        let mut table = FileTable::new();
        let file = table.file_mut(0);
        let oversized = [7u8; FILE_DATA_SIZE + 100];
        let written = file.set_data(&oversized);
        assert_eq!(written, FILE_DATA_SIZE);
        assert_eq!(file.size(), FILE_DATA_SIZE);
    }

    #[test]
    fn lookup_finds_in_use_file_by_name() {
        let mut table = FileTable::new();
        {
            let file = table.file_mut(1);
            file.name[..5].copy_from_slice(b"hello");
            file.name_len = 5;
            file.in_use = true;
        }
        assert_eq!(table.lookup("hello"), Ok(1));
        assert_eq!(table.lookup("nope"), Err(KernelError::FileNotFound));
    }

    /// Reproduces `init`/`flush`'s packing logic directly over a byte
    /// buffer (no virtio device needed): a small first file's data doesn't
    /// push a much larger next header off to a fixed slot boundary, it
    /// sits right after the first file's sector-padded data, as a real
    /// TAR stream would.
    #[test]
    fn dynamic_cursor_packs_small_file_before_next_header() {
        let mut disk = [0u8; DISK_MAX_SIZE];
        let mut cursor = 0usize;

        let header0: &mut [u8; tar::HEADER_SIZE] =
            (&mut disk[cursor..cursor + tar::HEADER_SIZE]).try_into().unwrap();
        tar::write_header(header0, b"hello.txt", 0);
        cursor = align_up(cursor + tar::HEADER_SIZE, SECTOR_SIZE);
        let second_header_off = cursor;

        let header1: &mut [u8; tar::HEADER_SIZE] =
            (&mut disk[cursor..cursor + tar::HEADER_SIZE]).try_into().unwrap();
        tar::write_header(header1, b"big.txt", FILE_DATA_SIZE as u32);
        disk[cursor + tar::HEADER_SIZE..cursor + tar::HEADER_SIZE + FILE_DATA_SIZE]
            .copy_from_slice(&[9u8; FILE_DATA_SIZE]);

        // The second header sits immediately after the first file's single
        // padded sector, not at `2 * (HEADER_SIZE + FILE_DATA_SIZE)`.
        assert_eq!(second_header_off, SECTOR_SIZE);

        let (name, size) = tar::parse_header(
            disk[second_header_off..second_header_off + tar::HEADER_SIZE]
                .try_into()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(name, "big.txt");
        assert_eq!(size, FILE_DATA_SIZE as u32);
    }
}
