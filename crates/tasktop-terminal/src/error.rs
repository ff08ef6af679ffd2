//! Error types for tasktop-terminal.

use std::path::PathBuf;
use tasktop_core::{CaptureError, SchedulerError};
use thiserror::Error;

/// Errors that can occur in the terminal front end.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// IO error from terminal operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or parsed.
    #[error("config {path}: {message}")]
    Config {
        /// File involved.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Process information could not be captured.
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// Background sampler could not start.
    #[error("sampler: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Log output could not be set up.
    #[error("logging: {0}")]
    Logging(String),

    /// Headless output could not be serialized.
    #[error("JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

impl TerminalError {
    /// Build a [`TerminalError::Config`].
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_error_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TerminalError = io_err.into();
        assert!(matches!(err, TerminalError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_terminal_error_config() {
        let err = TerminalError::config("/etc/tasktop.yaml", "bad refresh_ms");
        assert_eq!(err.to_string(), "config /etc/tasktop.yaml: bad refresh_ms");
    }

    #[test]
    fn test_terminal_error_capture() {
        let err: TerminalError = CaptureError::Unavailable("no /proc".to_string()).into();
        assert!(err.to_string().starts_with("capture failed: "));
        assert!(err.to_string().contains("no /proc"));
    }
}
