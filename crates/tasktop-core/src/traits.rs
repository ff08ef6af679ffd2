//! Collaborator seams.
//!
//! The engine reaches the operating system and the screen only through these
//! traits; the terminal crate provides the production implementations and
//! tests provide in-memory fakes.

use crate::error::{InspectError, SettingsError, TerminateError};
use crate::focus::{Checkbox, FocusRegion};
use crate::menu::ContextAction;
use crate::refresh::Row;
use crate::sample::{IoCounters, MemorySample, RawProcessInfo};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Reads memory and process information from the host.
///
/// Only [`ProcessInspector::memory`] and [`ProcessInspector::list_processes`]
/// may block.
pub trait ProcessInspector: Send {
    /// Current system memory.
    fn memory(&mut self) -> Result<MemorySample, InspectError>;

    /// Every process the host reports right now.
    fn list_processes(&mut self) -> Result<Vec<RawProcessInfo>, InspectError>;

    /// Resolved executable path of `pid`.
    fn exe_path(&self, pid: u32) -> Result<PathBuf, InspectError>;

    /// Disk I/O counters of `pid`.
    fn io_counters(&self, pid: u32) -> Result<IoCounters, InspectError>;

    /// Whether the current user may list `dir`.
    fn is_dir_readable(&self, dir: &Path) -> bool {
        std::fs::read_dir(dir).is_ok()
    }
}

/// Sends terminate requests.
pub trait TerminationService {
    /// Ask `pid` to terminate.
    fn terminate(&mut self, pid: u32) -> Result<(), TerminateError>;
}

/// Source of the persisted filter toggles. The engine reads them each tick
/// and writes them only when the user flips a checkbox.
pub trait SettingsProvider {
    /// Hide system processes.
    fn hide_system_processes(&self) -> bool;

    /// Hide processes with unreadable executables.
    fn hide_inaccessible_processes(&self) -> bool;

    /// Store the hide-system toggle.
    fn set_hide_system_processes(&mut self, value: bool) -> Result<(), SettingsError>;

    /// Store the hide-inaccessible toggle.
    fn set_hide_inaccessible_processes(&mut self, value: bool) -> Result<(), SettingsError>;

    /// Read a toggle by checkbox.
    fn checkbox(&self, checkbox: Checkbox) -> bool {
        match checkbox {
            Checkbox::HideSystem => self.hide_system_processes(),
            Checkbox::HideInaccessible => self.hide_inaccessible_processes(),
        }
    }

    /// Store a toggle by checkbox.
    fn set_checkbox(&mut self, checkbox: Checkbox, value: bool) -> Result<(), SettingsError> {
        match checkbox {
            Checkbox::HideSystem => self.set_hide_system_processes(value),
            Checkbox::HideInaccessible => self.set_hide_inaccessible_processes(value),
        }
    }
}

/// Non-persisting settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InMemorySettings {
    /// Hide system processes.
    pub hide_system: bool,
    /// Hide inaccessible processes.
    pub hide_inaccessible: bool,
}

impl SettingsProvider for InMemorySettings {
    fn hide_system_processes(&self) -> bool {
        self.hide_system
    }

    fn hide_inaccessible_processes(&self) -> bool {
        self.hide_inaccessible
    }

    fn set_hide_system_processes(&mut self, value: bool) -> Result<(), SettingsError> {
        self.hide_system = value;
        Ok(())
    }

    fn set_hide_inaccessible_processes(&mut self, value: bool) -> Result<(), SettingsError> {
        self.hide_inaccessible = value;
        Ok(())
    }
}

/// The presentation layer. Owned and called on the UI thread only.
pub trait UiShell {
    /// Replace every table row.
    fn set_rows(&mut self, rows: &[Row]);

    /// First visible row.
    fn scroll_offset(&self) -> usize;

    /// Scroll so `offset` is the first visible row.
    fn set_scroll_offset(&mut self, offset: usize);

    /// Selected pids.
    fn selection(&self) -> BTreeSet<u32>;

    /// Replace the selected pids.
    fn set_selection(&mut self, pids: &BTreeSet<u32>);

    /// Turn the focus highlight of `region` on or off.
    fn set_focus_highlight(&mut self, region: FocusRegion, highlighted: bool);

    /// Present a context menu. A modal shell returns the chosen action;
    /// returning `None` leaves the menu open for keyboard or gamepad
    /// navigation, reported through [`UiShell::set_menu_cursor`].
    fn show_context_menu(&mut self, actions: &[ContextAction]) -> Option<ContextAction>;

    /// Status bar text.
    fn set_status(&mut self, message: &str);

    /// Suspend row-change notifications.
    fn begin_batch(&mut self) {}

    /// Resume row-change notifications.
    fn end_batch(&mut self) {}

    /// Memory readout.
    fn set_memory(&mut self, _memory: &MemorySample) {}

    /// Table row cursor.
    fn set_cursor(&mut self, _row: usize) {}

    /// Active menu entry, or `None` once the menu closes.
    fn set_menu_cursor(&mut self, _index: Option<usize>) {}

    /// Checkbox state.
    fn set_checkbox(&mut self, _checkbox: Checkbox, _checked: bool) {}

    /// Search field text.
    fn set_search_text(&mut self, _text: &str) {}

    /// Open an on-screen text entry helper for devices that cannot type.
    fn open_text_entry(&mut self, _current: &str) {}

    /// Show a message that needs acknowledging.
    fn show_message(&mut self, _title: &str, _body: &str) {}
}
