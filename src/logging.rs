//! Logging facility
//!
//! Plain `log` backend writing `[LEVEL] message` lines to stderr, keeping
//! stdout free for the boot record summary.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

pub static LOGGER: Logger = Logger;

pub struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(std::io::stderr().lock(), "[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Maps a `-v` count to a level: warnings by default, then info, debug and
/// trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Installs [`LOGGER`]. Fails if another logger is already set.
pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level_for(verbosity)))
}
