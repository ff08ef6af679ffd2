//! tracing subscriber setup.
//!
//! The interactive UI owns the terminal, so its logs go to a file. Headless
//! runs log to stderr, leaving stdout for the table or JSON.

use crate::error::TerminalError;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor a level is given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error.
    Stderr,
    /// Appended to a file.
    File(PathBuf),
    /// Discarded.
    Off,
}

/// Build the filter: `RUST_LOG` first, then `level`, then
/// [`DEFAULT_LOG_LEVEL`].
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.unwrap_or(DEFAULT_LOG_LEVEL)))
        .unwrap_or_else(|err| {
            eprintln!("invalid log level {level:?}: {err}, using {DEFAULT_LOG_LEVEL}");
            EnvFilter::new(DEFAULT_LOG_LEVEL)
        })
}

/// Install the global subscriber.
pub fn init_logging(target: &LogTarget, level: Option<&str>) -> Result<(), TerminalError> {
    let filter = env_filter(level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true);

    let result = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| TerminalError::Logging(format!("{}: {e}", path.display())))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    result.map_err(|e| TerminalError::Logging(e.to_string()))
}

/// Default log file for interactive runs.
pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("tasktop.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_level() {
        let filter = env_filter(Some("debug"));
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_env_filter_bad_level_falls_back() {
        // Only meaningful when RUST_LOG is unset; either way it must not panic.
        let _ = env_filter(Some("[[not a filter"));
    }

    #[test]
    fn test_init_logging_off() {
        assert!(init_logging(&LogTarget::Off, None).is_ok());
    }

    #[test]
    fn test_default_log_file_name() {
        assert!(default_log_file().ends_with("tasktop.log"));
    }
}
