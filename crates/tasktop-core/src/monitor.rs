//! UI-thread controller.
//!
//! [`Monitor`] owns everything the UI thread mutates: focus, the open menu,
//! the search query and the displayed rows. Snapshots arrive from the
//! capture scheduler by value; input arrives as [`InputCommand`]s from the
//! adapters. Every visible change goes out through a [`UiShell`].

use crate::filter::{self, FilterState};
use crate::focus::{Checkbox, FocusEffect, FocusNavigator, FocusRegion};
use crate::input::{InputCommand, InputSource, Key, KeyboardAdapter, NavigationEvent};
use crate::menu::{ContextAction, MenuNavigator, MenuOutcome, Target};
use crate::refresh::{RefreshController, Row, StatusSummary};
use crate::sample::Snapshot;
use crate::scheduler::CaptureResult;
use crate::termination::{self, TerminationReport};
use crate::traits::{SettingsProvider, TerminationService, UiShell};

/// Wall-clock stamp for the status line.
fn clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Controller for one monitor window.
pub struct Monitor<S, T> {
    settings: S,
    terminator: T,
    search_query: String,
    focus: FocusNavigator,
    menu: MenuNavigator,
    refresh: RefreshController,
    keyboard: KeyboardAdapter,
    snapshot: Option<Snapshot>,
    rows: Vec<Row>,
    summary: StatusSummary,
    capture_error: Option<String>,
    last_report: Option<TerminationReport>,
}

impl<S: SettingsProvider, T: TerminationService> Monitor<S, T> {
    /// Create a monitor showing at most `row_limit` rows (0 = all).
    pub fn new(settings: S, terminator: T, row_limit: usize) -> Self {
        Self {
            settings,
            terminator,
            search_query: String::new(),
            focus: FocusNavigator::new(),
            menu: MenuNavigator::new(),
            refresh: RefreshController::new(row_limit),
            keyboard: KeyboardAdapter::new(),
            snapshot: None,
            rows: Vec::new(),
            summary: StatusSummary::default(),
            capture_error: None,
            last_report: None,
        }
    }

    /// Push the initial focus, checkbox and search state to `shell`.
    pub fn attach(&mut self, shell: &mut dyn UiShell) {
        for (region, on) in self.focus.highlights() {
            shell.set_focus_highlight(region, on);
        }
        for checkbox in [Checkbox::HideSystem, Checkbox::HideInaccessible] {
            shell.set_checkbox(checkbox, self.settings.checkbox(checkbox));
        }
        shell.set_search_text(&self.search_query);
        shell.set_cursor(self.focus.row());
        shell.set_status("Collecting process information...");
    }

    /// Current filter inputs; the toggles are read from settings every call.
    pub fn filter_state(&self) -> FilterState {
        FilterState {
            hide_system_processes: self.settings.hide_system_processes(),
            hide_inaccessible_processes: self.settings.hide_inaccessible_processes(),
            search_query: self.search_query.clone(),
        }
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Apply a finished capture. A failure is reported once until the next
    /// success; the scheduler simply retries on its next tick.
    pub fn apply_capture(&mut self, shell: &mut dyn UiShell, result: CaptureResult) {
        match result {
            Ok(snapshot) => self.apply_snapshot(shell, snapshot),
            Err(err) => {
                let message = err.to_string();
                if self.capture_error.as_deref() != Some(message.as_str()) {
                    tracing::warn!(error = %message, "capture failed");
                    shell.set_status(&format!("Error: {message}"));
                    self.capture_error = Some(message);
                }
            }
        }
    }

    /// Replace the current snapshot and rebuild the table.
    pub fn apply_snapshot(&mut self, shell: &mut dyn UiShell, snapshot: Snapshot) {
        self.capture_error = None;
        shell.set_memory(&snapshot.memory);
        self.snapshot = Some(snapshot);
        self.rebuild(shell);
    }

    /// Re-run filter, sort and refresh against the current snapshot.
    pub fn rebuild(&mut self, shell: &mut dyn UiShell) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let ordered = filter::apply(snapshot, &self.filter_state());
        let (rebuilt, summary) = self.refresh.refresh(shell, &ordered, snapshot.len());
        self.rows = rebuilt.rows;
        self.summary = summary;
        self.focus.set_row_count(self.rows.len());
        shell.set_cursor(self.focus.row());
        shell.set_status(&summary.message(&clock()));
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Handle one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, shell: &mut dyn UiShell, key: Key) -> bool {
        match self.keyboard.translate(key, self.focus.region()) {
            Some(command) => self.handle_command(shell, command, InputSource::Keyboard),
            None => false,
        }
    }

    /// Handle one adapter command. Returns `true` when the user asked to
    /// quit. An open menu takes every navigation event.
    pub fn handle_command(
        &mut self,
        shell: &mut dyn UiShell,
        command: InputCommand,
        source: InputSource,
    ) -> bool {
        if command == InputCommand::Quit {
            return true;
        }

        if self.menu.is_open() {
            if let InputCommand::Navigate(event) = command {
                self.handle_menu(shell, event);
            }
            return false;
        }

        match command {
            InputCommand::Navigate(event) => {
                let effect = self.focus.handle(event);
                self.apply_effect(shell, effect, source);
            }
            InputCommand::Scroll(delta) => {
                if self.focus.region() == FocusRegion::Table {
                    let row = self.focus.row().saturating_add_signed(delta);
                    if let FocusEffect::RowChanged(row) = self.focus.set_row(row) {
                        shell.set_cursor(row);
                    }
                }
            }
            InputCommand::ToggleSelection => {
                if self.focus.region() == FocusRegion::Table {
                    if let Some(pid) = self.cursor_pid() {
                        self.toggle_selection(shell, pid);
                    }
                }
            }
            InputCommand::FocusSearch => {
                let effect = self.focus.focus(FocusRegion::SearchField);
                self.apply_effect(shell, effect, source);
            }
            InputCommand::NextRegion => {
                let effect = self.focus.focus(self.focus.region().next());
                self.apply_effect(shell, effect, source);
            }
            InputCommand::PrevRegion => {
                let effect = self.focus.focus(self.focus.region().prev());
                self.apply_effect(shell, effect, source);
            }
            InputCommand::InsertChar(c) => {
                if self.focus.region() == FocusRegion::SearchField {
                    self.search_query.push(c);
                    self.search_changed(shell);
                }
            }
            InputCommand::DeleteChar => {
                if self.search_query.pop().is_some() {
                    self.search_changed(shell);
                }
            }
            InputCommand::Quit => {}
        }
        false
    }

    /// Replace the search text, e.g. from an on-screen text entry helper.
    pub fn set_search_query(&mut self, shell: &mut dyn UiShell, query: &str) {
        if self.search_query != query {
            self.search_query = query.to_string();
            self.search_changed(shell);
        }
    }

    fn search_changed(&mut self, shell: &mut dyn UiShell) {
        shell.set_search_text(&self.search_query);
        self.rebuild(shell);
    }

    fn apply_effect(&mut self, shell: &mut dyn UiShell, effect: FocusEffect, source: InputSource) {
        match effect {
            FocusEffect::None => {}
            FocusEffect::Moved { from, to } => {
                shell.set_focus_highlight(from, false);
                shell.set_focus_highlight(to, true);
                if to == FocusRegion::Table {
                    shell.set_cursor(self.focus.row());
                }
            }
            FocusEffect::RowChanged(row) => shell.set_cursor(row),
            FocusEffect::OpenMenu => self.open_menu(shell),
            FocusEffect::Toggle(checkbox) => self.toggle_checkbox(shell, checkbox),
            FocusEffect::SearchConfirmed => {
                if source == InputSource::Gamepad {
                    shell.open_text_entry(&self.search_query);
                }
            }
            FocusEffect::ClearSearch { from } => {
                if from != FocusRegion::Table {
                    shell.set_focus_highlight(from, false);
                    shell.set_focus_highlight(FocusRegion::Table, true);
                    shell.set_cursor(self.focus.row());
                }
                if !self.search_query.is_empty() {
                    self.search_query.clear();
                    self.search_changed(shell);
                }
            }
        }
    }

    fn toggle_checkbox(&mut self, shell: &mut dyn UiShell, checkbox: Checkbox) {
        let value = !self.settings.checkbox(checkbox);
        let saved = self.settings.set_checkbox(checkbox, value);
        shell.set_checkbox(checkbox, self.settings.checkbox(checkbox));
        self.rebuild(shell);
        // After the rebuild so the failure is not replaced by the summary.
        if let Err(err) = saved {
            tracing::warn!(%err, ?checkbox, "filter toggle not saved");
            shell.set_status(&err.to_string());
        }
    }

    fn toggle_selection(&mut self, shell: &mut dyn UiShell, pid: u32) {
        let mut selection = shell.selection();
        if !selection.remove(&pid) {
            selection.insert(pid);
        }
        shell.set_selection(&selection);
        for row in &mut self.rows {
            row.selected = selection.contains(&row.pid);
        }
    }

    fn cursor_pid(&self) -> Option<u32> {
        self.rows.get(self.focus.row()).map(|row| row.pid)
    }

    // =========================================================================
    // Context menu
    // =========================================================================

    /// Selected rows in display order, or the cursor row if none.
    pub fn menu_targets(&self, shell: &dyn UiShell) -> Vec<Target> {
        let selection = shell.selection();
        let selected: Vec<Target> = self
            .rows
            .iter()
            .filter(|row| selection.contains(&row.pid))
            .map(|row| Target::new(row.pid, row.name.clone()))
            .collect();
        if !selected.is_empty() {
            return selected;
        }
        self.rows
            .get(self.focus.row())
            .map(|row| vec![Target::new(row.pid, row.name.clone())])
            .unwrap_or_default()
    }

    fn open_menu(&mut self, shell: &mut dyn UiShell) {
        let Some(pid) = self.cursor_pid() else {
            return;
        };
        let targets = self.menu_targets(shell);
        let actions = vec![
            ContextAction::EndTasks(targets),
            ContextAction::ToggleSelection {
                pid,
                selected: shell.selection().contains(&pid),
            },
        ];
        match shell.show_context_menu(&actions) {
            Some(chosen) => self.execute(shell, chosen),
            None => {
                self.menu.open(actions);
                shell.set_menu_cursor(Some(self.menu.cursor()));
            }
        }
    }

    fn handle_menu(&mut self, shell: &mut dyn UiShell, event: NavigationEvent) {
        match self.menu.handle(event) {
            MenuOutcome::NotOpen => {}
            MenuOutcome::Moved(index) => shell.set_menu_cursor(Some(index)),
            MenuOutcome::Triggered(action) => {
                shell.set_menu_cursor(None);
                self.execute(shell, action);
            }
            MenuOutcome::Closed => shell.set_menu_cursor(None),
        }
    }

    fn execute(&mut self, shell: &mut dyn UiShell, action: ContextAction) {
        match action {
            ContextAction::EndTasks(targets) => {
                let report = termination::terminate_all(&mut self.terminator, &targets);
                shell.set_status(&report.status_line());
                if let Some(warning) = report.warning() {
                    shell.show_message("Error", &warning);
                }
                self.last_report = Some(report);
            }
            ContextAction::ToggleSelection { pid, .. } => self.toggle_selection(shell, pid),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Focus state.
    pub fn focus(&self) -> &FocusNavigator {
        &self.focus
    }

    /// Context menu state.
    pub fn menu(&self) -> &MenuNavigator {
        &self.menu
    }

    /// Displayed rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Search text.
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Row counts from the last rebuild.
    pub fn summary(&self) -> StatusSummary {
        self.summary
    }

    /// Settings provider.
    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Termination service.
    pub fn terminator(&self) -> &T {
        &self.terminator
    }

    /// Outcome of the most recent terminate batch.
    pub fn last_report(&self) -> Option<&TerminationReport> {
        self.last_report.as_ref()
    }

    /// Latest capture failure, cleared by the next success.
    pub fn capture_error(&self) -> Option<&str> {
        self.capture_error.as_deref()
    }
}
