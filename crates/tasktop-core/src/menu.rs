//! Context menu actions and the menu navigator.
//!
//! While a menu is open it takes every navigation event: directions move a
//! cursor clamped to the action list, `Confirm` triggers the active action
//! and closes, `Cancel` closes without triggering.
//!
//! The navigator applies one step per event and keeps no timing of its own.
//! Held-direction pacing happens upstream: the gamepad adapter runs its
//! [`crate::RepeatTimer`] before events reach the menu, and keyboard
//! repeat comes from the OS.

use crate::input::NavigationEvent;

/// A process targeted by a menu action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Process id.
    pub pid: u32,
    /// Display name.
    pub name: String,
}

impl Target {
    /// Create a target.
    #[must_use]
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

/// An entry in the process context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextAction {
    /// Send a terminate request to every target.
    EndTasks(Vec<Target>),
    /// Mark or unmark a row as selected.
    ToggleSelection {
        /// Row process id.
        pid: u32,
        /// Whether the row is currently selected.
        selected: bool,
    },
}

impl ContextAction {
    /// Menu label.
    pub fn label(&self) -> String {
        match self {
            Self::EndTasks(targets) => match targets.as_slice() {
                [single] => format!("End Task: {}", single.name),
                many => format!("End {} Tasks", many.len()),
            },
            Self::ToggleSelection { selected: true, .. } => "Deselect".to_string(),
            Self::ToggleSelection { selected: false, .. } => "Select".to_string(),
        }
    }
}

/// Result of feeding an event to an open menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    /// The menu was closed; the event belongs to the focus navigator.
    NotOpen,
    /// The cursor moved (or stayed at an edge).
    Moved(usize),
    /// The active action was chosen and the menu closed.
    Triggered(ContextAction),
    /// The menu closed without an action.
    Closed,
}

/// Cursor over an open context menu.
#[derive(Debug, Clone, Default)]
pub struct MenuNavigator {
    actions: Vec<ContextAction>,
    cursor: usize,
}

impl MenuNavigator {
    /// Create a closed navigator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open with `actions`, cursor on the first. An empty list stays closed.
    pub fn open(&mut self, actions: Vec<ContextAction>) -> bool {
        self.actions = actions;
        self.cursor = 0;
        self.is_open()
    }

    /// Close without triggering.
    pub fn close(&mut self) {
        self.actions.clear();
        self.cursor = 0;
    }

    /// Whether a menu is open.
    pub fn is_open(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Active action index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Actions of the open menu.
    pub fn actions(&self) -> &[ContextAction] {
        &self.actions
    }

    /// Apply one event.
    pub fn handle(&mut self, event: NavigationEvent) -> MenuOutcome {
        if !self.is_open() {
            return MenuOutcome::NotOpen;
        }
        let last = self.actions.len() - 1;
        match event {
            NavigationEvent::Up | NavigationEvent::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                MenuOutcome::Moved(self.cursor)
            }
            NavigationEvent::Down | NavigationEvent::Right => {
                self.cursor = (self.cursor + 1).min(last);
                MenuOutcome::Moved(self.cursor)
            }
            NavigationEvent::Confirm => {
                let action = self.actions.swap_remove(self.cursor.min(last));
                self.close();
                MenuOutcome::Triggered(action)
            }
            NavigationEvent::Cancel => {
                self.close();
                MenuOutcome::Closed
            }
        }
    }
}
