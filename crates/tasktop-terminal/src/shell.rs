//! crossterm implementation of the engine's [`UiShell`].
//!
//! The shell only stores what the engine tells it; [`TerminalShell::render`]
//! lays that state out for a given terminal size.
//!
//! ```text
//! tasktop  Memory [██████░░░░░░░░░░] 41.3%  6.61 / 16.00 GiB
//! [ ] Hide system processes  [x] Hide inaccessible processes  Search: fire
//!     PID  NAME                 USER          MEM (MiB)   MEM %  CPU %  DISK I/O
//! *  4211  firefox              alice            1024.0     6.3    2.0   1.2 MiB
//! Ready - Last updated: 12:00:01 | Total Processes: 312
//! ```

use crate::frame::{fit, fit_right, hex_color, Frame, Line, Span, Style};
use crossterm::style::Color;
use std::collections::BTreeSet;
use std::io::{self, Write};
use tasktop_core::{
    Checkbox, ContextAction, FocusRegion, Key, MemorySample, Row, RowTint, UiShell, GIB, MIB,
};

/// Rows above the table: title, filters, header.
const HEADER_LINES: usize = 3;
/// Rows below the table: status.
const FOOTER_LINES: usize = 1;
/// Cells in the memory gauge bar.
const GAUGE_CELLS: usize = 20;

const PID_W: usize = 7;
const USER_W: usize = 12;
const MEM_W: usize = 10;
const PCT_W: usize = 7;
const IO_W: usize = 10;
const MIN_NAME_W: usize = 8;

const TINT_HIGH: Color = Color::Rgb { r: 90, g: 30, b: 30 };
const TINT_MEDIUM: Color = Color::Rgb { r: 90, g: 70, b: 20 };
const ACCENT: Color = Color::Rgb {
    r: 100,
    g: 200,
    b: 255,
};

/// Result of a key sent to the text entry prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEntryOutcome {
    /// Still editing.
    Editing,
    /// Accepted with this text.
    Commit(String),
    /// Abandoned.
    Cancelled,
}

/// Terminal presentation state.
#[derive(Debug, Clone)]
pub struct TerminalShell {
    rows: Vec<Row>,
    scroll: usize,
    cursor: usize,
    viewport: usize,
    selection: BTreeSet<u32>,
    focused: FocusRegion,
    checkboxes: [bool; 2],
    search_text: String,
    status: String,
    memory: Option<MemorySample>,
    menu: Vec<ContextAction>,
    menu_cursor: Option<usize>,
    message: Option<(String, String)>,
    text_entry: Option<String>,
    batch_depth: usize,
    dirty: bool,
    color: bool,
}

impl Default for TerminalShell {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TerminalShell {
    /// Create an empty shell.
    pub fn new(color: bool) -> Self {
        Self {
            rows: Vec::new(),
            scroll: 0,
            cursor: 0,
            viewport: 20,
            selection: BTreeSet::new(),
            focused: FocusRegion::Table,
            checkboxes: [false; 2],
            search_text: String::new(),
            status: String::new(),
            memory: None,
            menu: Vec::new(),
            menu_cursor: None,
            message: None,
            text_entry: None,
            batch_depth: 0,
            dirty: true,
            color,
        }
    }

    // =========================================================================
    // Host-side state
    // =========================================================================

    /// Whether anything changed since the last draw. Always `false` inside
    /// a batch.
    pub fn is_dirty(&self) -> bool {
        self.dirty && self.batch_depth == 0
    }

    /// Force the next draw, e.g. after a resize.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Table rows that fit in a terminal `height` rows tall.
    pub fn table_height(height: u16) -> usize {
        (height as usize).saturating_sub(HEADER_LINES + FOOTER_LINES).max(1)
    }

    /// Set the visible table height and keep the cursor on screen.
    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        self.follow_cursor();
    }

    fn follow_cursor(&mut self) {
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + self.viewport {
            self.scroll = self.cursor + 1 - self.viewport;
        }
    }

    /// Displayed rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Status text.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Region drawn as focused.
    pub fn focused(&self) -> FocusRegion {
        self.focused
    }

    /// Whether a message is waiting to be acknowledged.
    pub fn has_message(&self) -> bool {
        self.message.is_some()
    }

    /// Acknowledge the current message.
    pub fn dismiss_message(&mut self) {
        if self.message.take().is_some() {
            self.dirty = true;
        }
    }

    /// Whether the text entry prompt is open.
    pub fn text_entry_active(&self) -> bool {
        self.text_entry.is_some()
    }

    /// Feed one key to the text entry prompt.
    pub fn text_entry_key(&mut self, key: Key) -> TextEntryOutcome {
        let Some(text) = self.text_entry.as_mut() else {
            return TextEntryOutcome::Cancelled;
        };
        self.dirty = true;
        match key {
            Key::Enter => {
                let committed = std::mem::take(text);
                self.text_entry = None;
                TextEntryOutcome::Commit(committed)
            }
            Key::Esc | Key::Ctrl('c') => {
                self.text_entry = None;
                TextEntryOutcome::Cancelled
            }
            Key::Backspace => {
                text.pop();
                TextEntryOutcome::Editing
            }
            Key::Char(c) => {
                text.push(c);
                TextEntryOutcome::Editing
            }
            _ => TextEntryOutcome::Editing,
        }
    }

    /// Whether the context menu is open.
    pub fn menu_open(&self) -> bool {
        self.menu_cursor.is_some()
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Lay out the current state for a `width` x `height` terminal.
    pub fn render(&self, width: u16, height: u16) -> Frame {
        let width = width as usize;
        let table_rows = Self::table_height(height);

        let mut lines = Vec::with_capacity(height as usize);
        lines.push(self.render_title());
        lines.push(self.render_filters());
        lines.push(Line::styled(
            fit(&self.header_text(width), width),
            Style::PLAIN.bold(),
        ));

        let visible = self.rows.iter().enumerate().skip(self.scroll).take(table_rows);
        let mut drawn = 0;
        for (index, row) in visible {
            lines.push(self.render_row(index, row, width));
            drawn += 1;
        }
        if self.rows.is_empty() {
            lines.push(Line::plain("  No processes to show"));
            drawn += 1;
        }
        for _ in drawn..table_rows {
            lines.push(Line::default());
        }

        lines.push(Line::styled(fit(&self.status, width), Style::PLAIN.reverse()));

        if self.menu_cursor.is_some() && !self.menu.is_empty() {
            self.overlay(&mut lines, width, self.menu_box());
        }
        if let Some(text) = &self.text_entry {
            let body = vec![
                Line::styled(" Search ", Style::PLAIN.bold()),
                Line::plain(format!(" {text}_ ")),
                Line::plain(" Enter to accept, Esc to cancel "),
            ];
            self.overlay(&mut lines, width, body);
        }
        if let Some((title, body)) = &self.message {
            let mut boxed = vec![Line::styled(format!(" {title} "), Style::PLAIN.bold())];
            boxed.extend(body.lines().map(|l| Line::plain(format!(" {l} "))));
            boxed.push(Line::plain(" Press any key "));
            self.overlay(&mut lines, width, boxed);
        }

        Frame {
            lines: lines
                .into_iter()
                .take(height as usize)
                .map(|l| l.truncated(width))
                .collect(),
        }
    }

    /// Render and write to `out`.
    pub fn draw<W: Write>(&mut self, out: &mut W, width: u16, height: u16) -> io::Result<()> {
        self.set_viewport(Self::table_height(height));
        let frame = self.render(width, height);
        frame.write_to(out, self.color)?;
        self.dirty = false;
        Ok(())
    }

    fn render_title(&self) -> Line {
        let mut spans = vec![Span::new("tasktop  ", Style::PLAIN.bold().fg(ACCENT))];
        match &self.memory {
            Some(memory) => {
                let filled = ((memory.percent / 100.0) * GAUGE_CELLS as f64).round() as usize;
                let filled = filled.min(GAUGE_CELLS);
                let gauge_style = hex_color(memory.level().hex())
                    .map_or(Style::PLAIN, |c| Style::PLAIN.fg(c));
                spans.push(Span::plain("Memory ["));
                spans.push(Span::new("█".repeat(filled), gauge_style));
                spans.push(Span::plain("░".repeat(GAUGE_CELLS - filled)));
                spans.push(Span::plain(format!(
                    "] {:.1}%  {:.2} / {:.2} GiB",
                    memory.percent,
                    memory.used as f64 / GIB,
                    memory.total as f64 / GIB
                )));
            }
            None => spans.push(Span::plain("Memory: collecting...")),
        }
        Line::new(spans)
    }

    fn render_filters(&self) -> Line {
        let mut spans = Vec::new();
        for (i, checkbox) in [Checkbox::HideSystem, Checkbox::HideInaccessible]
            .into_iter()
            .enumerate()
        {
            let mark = if self.checkboxes[i] { 'x' } else { ' ' };
            let style = if self.focused == checkbox.region() {
                Style::PLAIN.reverse()
            } else {
                Style::PLAIN
            };
            spans.push(Span::new(format!("[{mark}] {}", checkbox.label()), style));
            spans.push(Span::plain("  "));
        }
        let search_style = if self.focused == FocusRegion::SearchField {
            Style::PLAIN.reverse()
        } else {
            Style::PLAIN
        };
        let cursor = if self.focused == FocusRegion::SearchField {
            "_"
        } else {
            ""
        };
        spans.push(Span::new(
            format!("Search: {}{cursor}", self.search_text),
            search_style,
        ));
        Line::new(spans)
    }

    fn name_width(width: usize) -> usize {
        let fixed = 2 + PID_W + 2 + USER_W + 1 + MEM_W + 1 + PCT_W + 1 + PCT_W + 1 + IO_W;
        width.saturating_sub(fixed).max(MIN_NAME_W)
    }

    fn header_text(&self, width: usize) -> String {
        format!(
            "  {}  {} {} {} {} {} {}",
            fit_right("PID", PID_W),
            fit("NAME", Self::name_width(width)),
            fit("USER", USER_W),
            fit_right("MEM (MiB)", MEM_W),
            fit_right("MEM %", PCT_W),
            fit_right("CPU %", PCT_W),
            fit_right("DISK I/O", IO_W),
        )
    }

    fn render_row(&self, index: usize, row: &Row, width: usize) -> Line {
        let marker = if row.selected || self.selection.contains(&row.pid) {
            "* "
        } else {
            "  "
        };
        let text = format!(
            "{marker}{}  {} {} {} {} {} {}",
            fit_right(&row.pid.to_string(), PID_W),
            fit(&row.name, Self::name_width(width)),
            fit(&row.owner, USER_W),
            fit_right(&format!("{:.1}", row.memory_bytes as f64 / MIB), MEM_W),
            fit_right(&format!("{:.1}", row.memory_percent), PCT_W),
            fit_right(&format!("{:.1}", row.cpu_percent), PCT_W),
            fit_right(&format_bytes(row.disk_io_bytes), IO_W),
        );

        let mut style = match row.tint {
            RowTint::High => Style::PLAIN.bg(TINT_HIGH),
            RowTint::Medium => Style::PLAIN.bg(TINT_MEDIUM),
            RowTint::None => Style::PLAIN,
        };
        if index == self.cursor && self.focused == FocusRegion::Table {
            style = style.reverse();
        }
        if row.selected {
            style = style.bold();
        }
        Line::styled(fit(&text, width), style)
    }

    fn menu_box(&self) -> Vec<Line> {
        let mut lines = vec![Line::styled(" Actions ", Style::PLAIN.bold())];
        for (i, action) in self.menu.iter().enumerate() {
            let style = if Some(i) == self.menu_cursor {
                Style::PLAIN.reverse()
            } else {
                Style::PLAIN
            };
            lines.push(Line::styled(format!(" {} ", action.label()), style));
        }
        lines
    }

    /// Draw `body` as a bordered box centred over `lines`.
    fn overlay(&self, lines: &mut [Line], width: usize, body: Vec<Line>) {
        let inner = body.iter().map(Line::width).max().unwrap_or(0).min(width.saturating_sub(2));
        let outer = inner + 2;
        let left = width.saturating_sub(outer) / 2;
        let top = lines.len().saturating_sub(body.len() + 2) / 2;
        let border = Style::PLAIN.bold().fg(ACCENT);

        let mut boxed = Vec::with_capacity(body.len() + 2);
        boxed.push(Line::styled(format!("┌{}┐", "─".repeat(inner)), border));
        for line in body {
            let pad = inner.saturating_sub(line.width());
            let mut spans = vec![Span::new("│", border)];
            spans.extend(line.truncated(inner).spans);
            spans.push(Span::plain(" ".repeat(pad)));
            spans.push(Span::new("│", border));
            boxed.push(Line::new(spans));
        }
        boxed.push(Line::styled(format!("└{}┘", "─".repeat(inner)), border));

        for (offset, content) in boxed.into_iter().enumerate() {
            let Some(target) = lines.get_mut(top + offset) else {
                break;
            };
            let mut spans = vec![Span::plain(" ".repeat(left))];
            spans.extend(content.spans);
            *target = Line::new(spans);
        }
    }
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    if b >= GIB {
        format!("{:.2} GiB", b / GIB)
    } else if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if bytes >= 1024 {
        format!("{:.1} KiB", b / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

impl UiShell for TerminalShell {
    fn set_rows(&mut self, rows: &[Row]) {
        self.rows = rows.to_vec();
        self.dirty = true;
    }

    fn scroll_offset(&self) -> usize {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll = offset;
        self.dirty = true;
    }

    fn selection(&self) -> BTreeSet<u32> {
        self.selection.clone()
    }

    fn set_selection(&mut self, pids: &BTreeSet<u32>) {
        self.selection = pids.clone();
        for row in &mut self.rows {
            row.selected = self.selection.contains(&row.pid);
        }
        self.dirty = true;
    }

    fn set_focus_highlight(&mut self, region: FocusRegion, highlighted: bool) {
        if highlighted {
            self.focused = region;
        }
        self.dirty = true;
    }

    fn show_context_menu(&mut self, actions: &[ContextAction]) -> Option<ContextAction> {
        self.menu = actions.to_vec();
        self.dirty = true;
        None
    }

    fn set_status(&mut self, message: &str) {
        message.clone_into(&mut self.status);
        self.dirty = true;
    }

    fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
    }

    fn set_memory(&mut self, memory: &MemorySample) {
        self.memory = Some(*memory);
        self.dirty = true;
    }

    fn set_cursor(&mut self, row: usize) {
        self.cursor = row;
        self.follow_cursor();
        self.dirty = true;
    }

    fn set_menu_cursor(&mut self, index: Option<usize>) {
        self.menu_cursor = index;
        if index.is_none() {
            self.menu.clear();
        }
        self.dirty = true;
    }

    fn set_checkbox(&mut self, checkbox: Checkbox, checked: bool) {
        let slot = match checkbox {
            Checkbox::HideSystem => 0,
            Checkbox::HideInaccessible => 1,
        };
        self.checkboxes[slot] = checked;
        self.dirty = true;
    }

    fn set_search_text(&mut self, text: &str) {
        text.clone_into(&mut self.search_text);
        self.dirty = true;
    }

    fn open_text_entry(&mut self, current: &str) {
        self.text_entry = Some(current.to_string());
        self.dirty = true;
    }

    fn show_message(&mut self, title: &str, body: &str) {
        self.message = Some((title.to_string(), body.to_string()));
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pid: u32, name: &str, mem_pct: f64) -> Row {
        Row {
            pid,
            name: name.to_string(),
            owner: "alice".to_string(),
            memory_bytes: 64 << 20,
            memory_percent: mem_pct,
            cpu_percent: 1.5,
            disk_io_bytes: 2048,
            tint: RowTint::from_memory_percent(mem_pct),
            selected: false,
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(3 << 20), "3.0 MiB");
        assert_eq!(format_bytes(3 << 30), "3.00 GiB");
    }

    #[test]
    fn test_render_fills_height() {
        let shell = TerminalShell::new(false);
        let frame = shell.render(100, 12);
        assert_eq!(frame.lines.len(), 12);
        assert!(frame.contains("No processes to show"));
    }

    #[test]
    fn test_render_rows_and_status() {
        let mut shell = TerminalShell::new(false);
        shell.set_rows(&[row(42, "firefox", 12.0), row(7, "bash", 1.0)]);
        shell.set_status("Ready");
        let frame = shell.render(100, 10);
        let text = frame.text();
        assert!(text[3].contains("42"));
        assert!(text[3].contains("firefox"));
        assert!(text[4].contains("bash"));
        assert!(text[9].starts_with("Ready"));
    }

    #[test]
    fn test_row_tint_and_cursor_style() {
        let mut shell = TerminalShell::new(true);
        shell.set_rows(&[row(1, "big", 12.0), row(2, "mid", 6.0), row(3, "small", 1.0)]);
        let frame = shell.render(100, 10);
        let first = &frame.lines[3].spans[0].style;
        assert_eq!(first.bg, Some(TINT_HIGH));
        assert!(first.reverse);
        assert_eq!(frame.lines[4].spans[0].style.bg, Some(TINT_MEDIUM));
        assert_eq!(frame.lines[5].spans[0].style.bg, None);
    }

    #[test]
    fn test_memory_gauge() {
        let mut shell = TerminalShell::new(true);
        shell.set_memory(&MemorySample::new(16 << 30, 4 << 30, 12 << 30));
        let frame = shell.render(100, 6);
        let title = frame.lines[0].text();
        assert!(title.contains("25.0%"));
        assert!(title.contains("4.00 / 16.00 GiB"));
        assert_eq!(title.matches('█').count(), 5);
    }

    #[test]
    fn test_checkbox_and_search_line() {
        let mut shell = TerminalShell::new(false);
        shell.set_checkbox(Checkbox::HideInaccessible, true);
        shell.set_search_text("fire");
        shell.set_focus_highlight(FocusRegion::Table, false);
        shell.set_focus_highlight(FocusRegion::SearchField, true);
        let text = shell.render(120, 6).lines[1].text();
        assert!(text.contains("[ ] Hide system processes"));
        assert!(text.contains("[x] Hide inaccessible processes"));
        assert!(text.contains("Search: fire_"));
    }

    #[test]
    fn test_cursor_scrolls_into_view() {
        let mut shell = TerminalShell::new(false);
        let rows: Vec<Row> = (0..50).map(|p| row(p, "p", 0.1)).collect();
        shell.set_rows(&rows);
        shell.set_viewport(10);
        shell.set_cursor(25);
        assert_eq!(shell.scroll_offset(), 16);
        shell.set_cursor(3);
        assert_eq!(shell.scroll_offset(), 3);
    }

    #[test]
    fn test_menu_overlay() {
        let mut shell = TerminalShell::new(false);
        shell.set_rows(&[row(1, "vim", 1.0)]);
        let actions = vec![
            ContextAction::EndTasks(vec![tasktop_core::Target::new(1, "vim")]),
            ContextAction::ToggleSelection {
                pid: 1,
                selected: false,
            },
        ];
        assert!(shell.show_context_menu(&actions).is_none());
        shell.set_menu_cursor(Some(1));
        let frame = shell.render(80, 20);
        assert!(frame.contains("End Task: vim"));
        assert!(shell.menu_open());

        shell.set_menu_cursor(None);
        assert!(!shell.render(80, 20).contains("End Task: vim"));
    }

    #[test]
    fn test_message_overlay_dismiss() {
        let mut shell = TerminalShell::new(false);
        shell.show_message("Error", "Access denied for:\nsshd (PID: 7)");
        let frame = shell.render(80, 20);
        assert!(frame.contains("Access denied for:"));
        assert!(frame.contains("sshd (PID: 7)"));
        shell.dismiss_message();
        assert!(!shell.has_message());
    }

    #[test]
    fn test_text_entry() {
        let mut shell = TerminalShell::new(false);
        shell.open_text_entry("ss");
        assert!(shell.text_entry_active());
        assert_eq!(shell.text_entry_key(Key::Char('h')), TextEntryOutcome::Editing);
        assert!(shell.render(80, 20).contains("ssh_"));
        assert_eq!(
            shell.text_entry_key(Key::Enter),
            TextEntryOutcome::Commit("ssh".to_string())
        );
        assert!(!shell.text_entry_active());
    }

    #[test]
    fn test_not_dirty_inside_batch() {
        let mut shell = TerminalShell::new(false);
        shell.begin_batch();
        shell.set_rows(&[row(1, "a", 1.0)]);
        assert!(!shell.is_dirty());
        shell.end_batch();
        assert!(shell.is_dirty());
    }

    #[test]
    fn test_draw_clears_dirty() {
        let mut shell = TerminalShell::new(false);
        let mut out = Vec::new();
        shell.draw(&mut out, 80, 10).unwrap();
        assert!(!shell.is_dirty());
        assert!(!out.is_empty());
    }
}
