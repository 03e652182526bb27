//! Build script: selects the RISC-V linker script and embeds the user
//! shell program as `_binary_shell_bin_start`/`_binary_shell_bin_size`,
//! mirroring how the teaching kernel's Makefile calls
//! `llvm-objcopy -O binary` on the shell ELF and links the result in
//! alongside the kernel image.

use std::env;
use std::path::PathBuf;
use std::process::Command;

fn main() {
    let target = env::var("TARGET").expect("TARGET not set");
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));

    if !target.contains("riscv32") {
        // Host builds (`cargo test`) need neither the linker script nor the
        // embedded shell image; only the real kernel binary does.
        return;
    }

    let linker_script = manifest_dir.join("src/arch/riscv/link.ld");
    println!("cargo:rustc-link-arg=-T{}", linker_script.display());
    println!("cargo:rerun-if-changed={}", linker_script.display());

    embed_shell_binary(&manifest_dir, &out_dir);
}

/// Builds `user/shell` for the bare-metal target, strips it to a raw binary,
/// and wraps it in a tiny object exposing `_binary_shell_bin_start` and
/// `_binary_shell_bin_size` via a `.incbin` directive — the same symbols
/// `_start`'s process table setup in `main.rs` expects from the linker.
fn embed_shell_binary(manifest_dir: &PathBuf, out_dir: &PathBuf) {
    let user_dir = manifest_dir.join("../user");
    println!("cargo:rerun-if-changed={}", user_dir.join("src").display());

    let status = Command::new("cargo")
        .args([
            "build",
            "--release",
            "--target",
            "riscv32imac-unknown-none-elf",
        ])
        .current_dir(&user_dir)
        .status();

    let elf_path = user_dir.join("target/riscv32imac-unknown-none-elf/release/shell");
    match status {
        Ok(s) if s.success() && elf_path.exists() => {}
        _ => {
            println!("cargo:warning=user/shell build failed or not found; embedding an empty shell image");
            std::fs::write(out_dir.join("shell.bin"), []).expect("write empty shell.bin");
            link_incbin(out_dir);
            return;
        }
    }

    let bin_path = out_dir.join("shell.bin");
    let status = Command::new("llvm-objcopy")
        .args(["-O", "binary"])
        .arg(&elf_path)
        .arg(&bin_path)
        .status();
    if !matches!(status, Ok(s) if s.success()) {
        println!("cargo:warning=llvm-objcopy failed; embedding an empty shell image");
        std::fs::write(&bin_path, []).expect("write empty shell.bin");
    }

    link_incbin(out_dir);
}

fn link_incbin(out_dir: &PathBuf) {
    let bin_path = out_dir.join("shell.bin");
    let asm_path = out_dir.join("shell_bin.s");
    // `_binary_shell_bin_size` must hold the byte count as its symbol
    // *value*, not the address of some byte — this is the same convention
    // `objcopy -Ibinary` itself uses (`main.rs` reads it with
    // `&_binary_shell_bin_size as usize`, never dereferencing it). `.set`
    // to `. - _binary_shell_bin_start` gives exactly that, unlike a bare
    // label after the `.incbin`, whose address would be
    // `start + size` rather than `size`.
    std::fs::write(
        &asm_path,
        format!(
            ".section .rodata.shell_bin\n\
             .global _binary_shell_bin_start\n\
             .global _binary_shell_bin_size\n\
             _binary_shell_bin_start:\n\
             .incbin \"{}\"\n\
             .set _binary_shell_bin_size, . - _binary_shell_bin_start\n",
            bin_path.display()
        ),
    )
    .expect("write shell_bin.s");

    cc::Build::new()
        .file(&asm_path)
        .compile("shell_bin");
}
