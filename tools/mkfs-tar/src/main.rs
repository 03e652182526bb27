//! mkfs-tar -- build a disk image for the kernel's flat in-memory file
//! table.
//!
//! The table holds at most `FILES_MAX` files. Each is written as a real
//! USTAR record — a 512-byte header immediately followed by its data,
//! zero-padded up to the next sector boundary — packed back-to-back the
//! way `kernel::fs::flush` serializes them, not at a fixed per-slot
//! stride. `kernel::fs::init` walks the image the same way until it hits
//! an all-zero header. These constants are kept in lockstep with
//! `kernel/src/config.rs`; if either moves, regenerate images with this
//! tool before booting against them.
//!
//! Usage:
//!   mkfs-tar --output <path> [--file <name>=<path>]...

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

const HEADER_SIZE: usize = 512;
const FILE_DATA_SIZE: usize = 1024;
const FILES_MAX: usize = 2;
const SECTOR_SIZE: usize = 512;

mod field {
    pub const NAME: usize = 0;
    pub const NAME_LEN: usize = 100;
    pub const MODE: usize = 100;
    pub const SIZE: usize = 124;
    pub const SIZE_LEN: usize = 12;
    pub const CHECKSUM: usize = 148;
    pub const CHECKSUM_LEN: usize = 8;
    pub const TYPEFLAG: usize = 156;
    pub const MAGIC: usize = 257;
    pub const VERSION: usize = 263;
}

const REGTYPE: u8 = b'0';

fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

fn int2oct(value: u32, field: &mut [u8]) {
    let digits = field.len() - 1;
    let mut v = value;
    for i in (0..digits).rev() {
        field[i] = b'0' + (v % 8) as u8;
        v /= 8;
    }
    field[digits] = 0;
}

fn write_checksum(block: &mut [u8; HEADER_SIZE]) {
    block[field::CHECKSUM..field::CHECKSUM + field::CHECKSUM_LEN].fill(b' ');
    let sum: u32 = block.iter().map(|&b| b as u32).sum();
    let checksum_field = &mut block[field::CHECKSUM..field::CHECKSUM + field::CHECKSUM_LEN];
    let mut v = sum;
    for i in (0..6).rev() {
        checksum_field[i] = b'0' + (v % 8) as u8;
        v /= 8;
    }
    checksum_field[6] = 0;
    checksum_field[7] = b' ';
}

fn write_header(block: &mut [u8; HEADER_SIZE], name: &[u8], size: u32) {
    let name_len = name.len().min(field::NAME_LEN);
    block[field::NAME..field::NAME + name_len].copy_from_slice(&name[..name_len]);
    block[field::MODE..field::MODE + 7].copy_from_slice(b"000644\0");
    int2oct(size, &mut block[field::SIZE..field::SIZE + field::SIZE_LEN]);
    block[field::TYPEFLAG] = REGTYPE;
    block[field::MAGIC..field::MAGIC + 6].copy_from_slice(b"ustar\0");
    block[field::VERSION..field::VERSION + 2].copy_from_slice(b"00");
    write_checksum(block);
}

struct Entry {
    name: String,
    data: Vec<u8>,
}

fn print_usage() {
    eprintln!("Usage: mkfs-tar --output <path> [--file <name>=<path>]...");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --output <path>          Output disk image path");
    eprintln!("  --file <name>=<path>     Embed a host file under the given in-image name");
    eprintln!();
    eprintln!("Up to {} files, each at most {} bytes.", FILES_MAX, FILE_DATA_SIZE);
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut output: Option<String> = None;
    let mut entries: Vec<Entry> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--output" | "-o" => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--file" | "-f" => {
                i += 1;
                let spec = &args[i];
                let (name, path) = spec.split_once('=').unwrap_or_else(|| {
                    eprintln!("Error: --file expects <name>=<path>, got {spec}");
                    std::process::exit(1);
                });
                let data = fs::read(path).unwrap_or_else(|e| {
                    eprintln!("Error reading {path}: {e}");
                    std::process::exit(1);
                });
                entries.push(Entry { name: name.to_string(), data });
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let output = output.unwrap_or_else(|| {
        eprintln!("Error: --output is required");
        print_usage();
        std::process::exit(1);
    });

    if entries.len() > FILES_MAX {
        eprintln!("Error: {} files given, but the table holds at most {}", entries.len(), FILES_MAX);
        std::process::exit(1);
    }

    let disk_max_size = align_up(FILES_MAX * align_up(HEADER_SIZE + FILE_DATA_SIZE, SECTOR_SIZE), SECTOR_SIZE);
    let mut image = vec![0u8; disk_max_size];

    let mut cursor = 0usize;
    for entry in &entries {
        if entry.data.len() > FILE_DATA_SIZE {
            eprintln!(
                "Error: {} is {} bytes, exceeding the {}-byte slot",
                entry.name,
                entry.data.len(),
                FILE_DATA_SIZE
            );
            std::process::exit(1);
        }
        let mut header = [0u8; HEADER_SIZE];
        write_header(&mut header, entry.name.as_bytes(), entry.data.len() as u32);
        image[cursor..cursor + HEADER_SIZE].copy_from_slice(&header);
        let data_start = cursor + HEADER_SIZE;
        image[data_start..data_start + entry.data.len()].copy_from_slice(&entry.data);
        cursor = align_up(data_start + entry.data.len(), SECTOR_SIZE);
    }

    let mut file = File::create(Path::new(&output)).unwrap_or_else(|e| {
        eprintln!("Error creating {output}: {e}");
        std::process::exit(1);
    });
    file.write_all(&image).unwrap_or_else(|e| {
        eprintln!("Error writing {output}: {e}");
        std::process::exit(1);
    });

    println!(
        "mkfs-tar: wrote {} ({} bytes, {} file(s))",
        output,
        image.len(),
        entries.len()
    );
}
