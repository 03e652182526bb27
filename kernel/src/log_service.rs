//! `log` crate front end backed by the SBI console.
//!
//! Every subsystem logs through `log::info!`/`log::warn!`/`log::error!`
//! rather than calling `print!` directly, so boot milestones, recoverable
//! warnings, and panics all funnel through one sink.

use core::fmt::Write;
use core::sync::atomic::{AtomicUsize, Ordering};

use log::{Level, LevelFilter, Metadata, Record};

use crate::arch::riscv::sbi;

struct KernelLogger;

static MAX_LEVEL: AtomicUsize = AtomicUsize::new(LevelFilter::Info as usize);

fn level_from_usize(v: usize) -> LevelFilter {
    match v {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

struct Sink;

impl Write for Sink {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for byte in s.bytes() {
            sbi::console_putchar(byte);
        }
        Ok(())
    }
}

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= level_from_usize(MAX_LEVEL.load(Ordering::Relaxed))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        let _ = writeln!(Sink, "[{tag}] {}", record.args());
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

/// Installs the kernel logger as the global `log` backend.
///
/// Safe to call once during early boot, before any other hart (there is
/// only one) or interrupt could race `log::set_logger`.
pub fn init(level: LevelFilter) {
    MAX_LEVEL.store(level as usize, Ordering::Relaxed);
    log::set_max_level(level);
    // `set_logger` only fails if called twice; boot calls it exactly once.
    let _ = log::set_logger(&LOGGER);
}
