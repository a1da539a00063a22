//! File-backed logger for diagnostics.
//!
//! The terminal owns stdout/stderr while the visualizer runs, so log records
//! go to a file instead. The file is created owner read/write only, since it
//! may name audio devices.

use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::Mutex;

/// Debug log file path (in /tmp for easy access)
pub const DEBUG_LOG_PATH: &str = "/tmp/ringviz.log";
/// Owner read/write only
const DEBUG_LOG_MODE: u32 = 0o600;

pub struct DebugLogger {
    file: Mutex<File>,
}

impl DebugLogger {
    /// Open `path`, creating it exclusively or truncating the existing file
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(DEBUG_LOG_MODE)
            .open(path)
            .or_else(|_| OpenOptions::new().write(true).truncate(true).open(path))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl Log for DebugLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "{:<5} {}: {}", record.level(), record.target(), record.args());
            let _ = f.flush();
        }
    }

    fn flush(&self) {
        if let Ok(mut f) = self.file.lock() {
            let _ = f.flush();
        }
    }
}

/// Most verbose level recorded; per-frame color changes log at Debug.
pub fn max_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Off
    }
}

/// Install the file logger when `debug` is set; otherwise logging stays off.
pub fn init(debug: bool) {
    if !debug {
        return;
    }
    match DebugLogger::open(Path::new(DEBUG_LOG_PATH)) {
        Ok(logger) => {
            if log::set_boxed_logger(Box::new(logger)).is_ok() {
                log::set_max_level(max_level(debug));
            }
        }
        Err(e) => eprintln!("ringviz: cannot open {}: {}", DEBUG_LOG_PATH, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn writes_records_to_file() {
        let path = std::env::temp_dir().join(format!("ringviz-log-test-{}.log", std::process::id()));
        let logger = DebugLogger::open(&path).unwrap();
        logger.log(
            &Record::builder()
                .args(format_args!("hello {}", 42))
                .level(Level::Warn)
                .target("ringviz")
                .build(),
        );
        logger.flush();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("WARN"));
        assert!(text.contains("hello 42"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn debug_flag_records_debug_level() {
        assert!(Level::Debug <= max_level(true));
        assert!(Level::Info <= max_level(true));
        assert_eq!(max_level(false), LevelFilter::Off);
    }
}
