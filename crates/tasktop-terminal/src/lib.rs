//! Terminal front end for tasktop.
//!
//! This crate implements the engine's collaborator traits on top of
//! `crossterm` and `sysinfo`:
//!
//! - [`TerminalShell`]: the [`tasktop_core::UiShell`] that lays the table
//!   out as styled text and writes it with crossterm
//! - [`FileSettings`]: filter toggles persisted to the YAML config
//! - `SysinfoInspector` / `SysinfoTerminator` (feature `cli`): the host
//!   process table and SIGTERM delivery
//!
//! [`App`] ties an engine to a shell; [`run_interactive`] drives it full
//! screen and [`run_once`] prints one capture for scripts.
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::struct_excessive_bools)]

pub mod app;
pub mod config;
pub mod error;
pub mod frame;
pub mod input;
#[cfg(feature = "cli")]
pub mod inspector;
pub mod keys;
pub mod logging;
pub mod shell;

pub use app::{
    run_interactive, run_once, write_snapshot, App, Gamepad, OnceOptions, OutputFormat,
    RunOptions,
};
pub use config::{FileSettings, TasktopConfig};
pub use error::TerminalError;
pub use frame::{Frame, Line, Span, Style};
pub use input::{InputHandler, TerminalEvent};
#[cfg(feature = "cli")]
pub use inspector::{SysinfoInspector, SysinfoTerminator};
pub use keys::map_key;
pub use logging::{default_log_file, init_logging, LogTarget};
pub use shell::{TerminalShell, TextEntryOutcome};
