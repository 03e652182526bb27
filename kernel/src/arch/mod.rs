//! Architecture support. This kernel targets `riscv32imac-unknown-none-elf`
//! only; the module is still namespaced under `riscv` rather than inlined
//! here so host (`cfg(test)`) unit tests can name items precisely.

pub mod riscv;
