//! Sampling, filtering, refresh and focus-navigation engine for tasktop.
//!
//! This crate holds everything in the monitor that is not I/O:
//! - Capture: [`Sampler`], [`CpuBaselineCache`] and the single-flight
//!   [`CaptureScheduler`]
//! - Table: the [`filter`] pipeline and the [`RefreshController`]
//! - Input: [`FocusNavigator`], [`MenuNavigator`], [`RepeatTimer`] and the
//!   keyboard and gamepad adapters
//! - Actions: batch termination with aggregated [`TerminationReport`]s
//!
//! The host is reached through the collaborator traits in [`traits`]
//! ([`ProcessInspector`], [`TerminationService`], [`SettingsProvider`],
//! [`UiShell`]), which the terminal crate implements.
//!
//! Pids are the only cross-tick identity. A pid recycled by the OS between
//! two ticks is treated as the same process, so a stale selection or CPU
//! baseline can carry over to the newcomer.
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::doc_markdown)]

mod cpu_cache;
mod error;
pub mod filter;
mod focus;
mod input;
mod menu;
mod monitor;
mod refresh;
mod repeat;
mod sample;
mod sampler;
mod scheduler;
mod termination;
pub mod traits;

pub use cpu_cache::CpuBaselineCache;
pub use error::{CaptureError, InspectError, SchedulerError, SettingsError, TerminateError};
pub use filter::{Filter, FilterState};
pub use focus::{Checkbox, FocusEffect, FocusNavigator, FocusRegion, FocusState};
pub use input::{
    Direction, GamepadAdapter, GamepadSource, GamepadState, InputCommand, InputSource, Key,
    KeyboardAdapter, NavigationEvent, BUTTON_CANCEL, BUTTON_CONFIRM, BUTTON_TOGGLE,
    DEFAULT_DEADZONE, PAGE_ROWS,
};
pub use menu::{ContextAction, MenuNavigator, MenuOutcome, Target};
pub use monitor::Monitor;
pub use refresh::{clamp_scroll, rebuild, Rebuild, RefreshController, Row, RowTint, StatusSummary};
pub use repeat::{RepeatTimer, DEFAULT_INITIAL_DELAY, DEFAULT_REPEAT_RATE};
pub use sample::{
    truncate_name, IoCounters, MemoryLevel, MemorySample, ProcessSample, RawProcessInfo,
    Snapshot, GIB, MAX_NAME_LEN, MIB,
};
pub use sampler::Sampler;
pub use scheduler::{CaptureResult, CaptureScheduler, SingleFlight, TickOutcome};
pub use termination::{terminate_all, TerminationReport, ELEVATION_HINT};
pub use traits::{InMemorySettings, ProcessInspector, SettingsProvider, TerminationService, UiShell};
