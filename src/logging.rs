//! Logging configuration for Datadesk.
//!
//! Interactive runs log to stderr; scheduled jobs, whose output nobody
//! watches, log to a file under the platform state directory.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// Log to stderr (interactive CLI runs).
    #[default]
    Stderr,
    /// Log to `datadesk.log` under the state directory (scheduled jobs).
    File,
}

/// Initializes the global tracing subscriber for the given mode.
///
/// Honors `RUST_LOG`; defaults to `info`. If the log file cannot be created
/// the process runs unlogged rather than failing the task it was asked to do.
pub fn init(mode: LogMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match mode {
        LogMode::Stderr => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
        LogMode::File => {
            let Some(log_file) = open_log_file() else {
                return;
            };
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(log_file)
                .with_ansi(false) // No ANSI colors in file output
                .init();
        }
    }
}

/// Opens the log file, creating its directory as needed.
///
/// Truncates on each run to avoid unbounded growth.
fn open_log_file() -> Option<File> {
    let log_path = log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return None;
        }
    }

    match File::create(&log_path) {
        Ok(f) => Some(f),
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            None
        }
    }
}

/// Returns the path for the log file.
///
/// Uses the XDG state directory on Linux (`~/.local/state/datadesk/`),
/// falling back to the config directory, then the temp directory.
pub fn log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("datadesk").join("datadesk.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("datadesk").join("datadesk.log");
    }

    std::env::temp_dir().join("datadesk.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_is_absolute() {
        assert!(log_path().is_absolute());
    }

    #[test]
    fn test_log_path_ends_with_datadesk_log() {
        assert!(log_path().ends_with("datadesk.log"));
    }

    #[test]
    fn test_default_mode_is_stderr() {
        assert_eq!(LogMode::default(), LogMode::Stderr);
    }
}
