//! Stderr backend for the `log` facade.
//!
//! Stdout carries the tree, so every log line goes to stderr as
//! `LEVEL message`.

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Environment variable consulted when no `-v` flag is given
pub const LOG_ENV: &str = "FAT32_TREE_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{:5} {}", record.level(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Map a `-v` count onto a level, starting from warnings.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Parse a level name as accepted in [`LOG_ENV`].
pub fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Level chosen from the flag count, falling back to [`LOG_ENV`].
pub fn resolve_level(verbose: u8, env_value: Option<&str>) -> LevelFilter {
    if verbose > 0 {
        return level_from_verbosity(verbose);
    }
    env_value
        .and_then(parse_level)
        .unwrap_or_else(|| level_from_verbosity(0))
}

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    if level >= Level::Debug {
        log::debug!("log level {}", level);
    }
    Ok(())
}
