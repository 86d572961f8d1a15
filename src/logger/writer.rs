//! Log writer module
//!
//! Thread-safe log writing to files or stdout/stderr. File targets can be
//! re-opened in place after an external log rotation.

use crate::config::LogLevel;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(File),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: fn() -> Self) -> io::Result<Self> {
        match path {
            Some(p) => open_log_file(p).map(Self::File),
            None => Ok(fallback()),
        }
    }

    fn write_line(&mut self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(f) => {
                let _ = writeln!(f, "{message}");
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    access: Mutex<LogTarget>,
    error: Mutex<LogTarget>,
    access_path: Option<String>,
    error_path: Option<String>,
    level: LogLevel,
}

impl LogWriter {
    fn new(
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
        level: LogLevel,
    ) -> io::Result<Self> {
        Ok(Self {
            access: Mutex::new(LogTarget::open(access_log_file, || LogTarget::Stdout)?),
            error: Mutex::new(LogTarget::open(error_log_file, || LogTarget::Stderr)?),
            access_path: access_log_file.map(ToString::to_string),
            error_path: error_log_file.map(ToString::to_string),
            level,
        })
    }

    /// Write to access log
    pub fn write_access(&self, message: &str) {
        lock(&self.access).write_line(message);
    }

    /// Write to error log
    pub fn write_error(&self, message: &str) {
        lock(&self.error).write_line(message);
    }

    /// Write info message (to access log target)
    pub fn write_info(&self, message: &str) {
        lock(&self.access).write_line(message);
    }

    /// Whether messages of `level` pass the configured threshold
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    /// Re-open file targets at their configured paths
    ///
    /// After `mv access.log access.log.1` the writer keeps appending to the
    /// renamed file until this is called.
    pub fn reopen(&self) -> io::Result<()> {
        if let Some(path) = &self.access_path {
            *lock(&self.access) = LogTarget::File(open_log_file(path)?);
        }
        if let Some(path) = &self.error_path {
            *lock(&self.error) = LogTarget::File(open_log_file(path)?);
        }
        Ok(())
    }
}

fn lock(target: &Mutex<LogTarget>) -> MutexGuard<'_, LogTarget> {
    // A panic mid-write leaves the target usable
    target.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    level: LogLevel,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, level)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, `None` before [`init`]
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
