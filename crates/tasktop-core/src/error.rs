//! Error types for tasktop-core.

use thiserror::Error;

/// Per-process read failure reported by a [`crate::ProcessInspector`].
///
/// `NotFound` and `AccessDenied` are distinguishable so the sampler can
/// drop vanished processes while still listing unreadable ones.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    /// The process exited (or never existed).
    #[error("process {0} not found")]
    NotFound(u32),

    /// The current user may not read this process.
    #[error("access denied for process {0}")]
    AccessDenied(u32),

    /// Any other platform failure.
    #[error("inspection failed: {0}")]
    Other(String),
}

/// Capture-level failure: the enumeration itself could not run.
///
/// Per-process failures never surface here; they only drop the process
/// from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Process or memory enumeration is unavailable on this host.
    #[error("process enumeration unavailable: {0}")]
    Unavailable(String),

    /// The inspector failed while listing processes.
    #[error("capture failed: {0}")]
    Inspect(#[from] InspectError),
}

/// Outcome classification for a failed terminate request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminateError {
    /// The process is already gone.
    #[error("no such process")]
    NotFound,

    /// The current user lacks permission to signal the process.
    #[error("access denied")]
    AccessDenied,

    /// Any other failure, with the platform message.
    #[error("{0}")]
    Other(String),
}

/// A [`crate::SettingsProvider`] could not store a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("settings not saved: {0}")]
pub struct SettingsError(pub String);

/// Errors raised by the background capture scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The sampler worker thread could not be started.
    #[error("failed to spawn sampler thread: {0}")]
    Spawn(#[from] std::io::Error),
}
