//! Table rebuild that keeps the user's place.
//!
//! Rows are rebuilt in full every tick inside a batch so the shell does not
//! emit per-row selection callbacks. Selected pids that survived the tick
//! stay selected and the rest are dropped; the scroll offset is restored and
//! clamped to the new row count.

use crate::sample::ProcessSample;
use crate::traits::UiShell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Background tint for a row, by memory share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowTint {
    /// 5% or less.
    None,
    /// Above 5%.
    Medium,
    /// Above 10%.
    High,
}

impl RowTint {
    /// Tint for a memory percent.
    pub fn from_memory_percent(percent: f64) -> Self {
        if percent > 10.0 {
            Self::High
        } else if percent > 5.0 {
            Self::Medium
        } else {
            Self::None
        }
    }
}

/// A rendered table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Process id.
    pub pid: u32,
    /// Process name.
    pub name: String,
    /// Owner account.
    pub owner: String,
    /// Resident memory in bytes.
    pub memory_bytes: u64,
    /// Share of total memory.
    pub memory_percent: f64,
    /// CPU percent.
    pub cpu_percent: f32,
    /// Disk I/O bytes.
    pub disk_io_bytes: u64,
    /// Background tint.
    pub tint: RowTint,
    /// Whether the row is selected.
    pub selected: bool,
}

impl Row {
    /// Build an unselected row from a sample.
    pub fn from_sample(sample: &ProcessSample) -> Self {
        Self {
            pid: sample.pid,
            name: sample.name.clone(),
            owner: sample.owner.clone(),
            memory_bytes: sample.memory_bytes,
            memory_percent: sample.memory_percent,
            cpu_percent: sample.cpu_percent,
            disk_io_bytes: sample.disk_io_bytes,
            tint: RowTint::from_memory_percent(sample.memory_percent),
            selected: false,
        }
    }
}

/// Row counts for the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSummary {
    /// Rows displayed.
    pub shown: usize,
    /// Processes passing the filters.
    pub matched: usize,
    /// Processes in the snapshot.
    pub total: usize,
}

impl StatusSummary {
    /// Status text stamped with `time` (`HH:MM:SS`). When the row limit
    /// cuts the list, both the matched and total counts are shown.
    pub fn message(&self, time: &str) -> String {
        if self.shown == self.total {
            format!(
                "Ready - Last updated: {time} | Total Processes: {}",
                self.total
            )
        } else if self.shown < self.matched {
            format!(
                "Ready - Last updated: {time} | Showing {} of {} matching ({} total)",
                self.shown, self.matched, self.total
            )
        } else {
            format!(
                "Ready - Last updated: {time} | Showing {} of {} processes",
                self.shown, self.total
            )
        }
    }
}

/// Rows and selection produced by one rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct Rebuild {
    /// Rows in display order.
    pub rows: Vec<Row>,
    /// Surviving selection.
    pub selection: BTreeSet<u32>,
}

/// Build rows from ordered samples, keeping at most `limit` (0 = all), and
/// carry over the selected pids still on screen.
pub fn rebuild(ordered: &[ProcessSample], prior: &BTreeSet<u32>, limit: usize) -> Rebuild {
    let take = if limit == 0 { ordered.len() } else { limit };
    let mut selection = BTreeSet::new();
    let rows = ordered
        .iter()
        .take(take)
        .map(|sample| {
            let mut row = Row::from_sample(sample);
            if prior.contains(&sample.pid) {
                row.selected = true;
                selection.insert(sample.pid);
            }
            row
        })
        .collect();
    Rebuild { rows, selection }
}

/// Clamp a scroll offset to `row_count` rows.
pub fn clamp_scroll(offset: usize, row_count: usize) -> usize {
    offset.min(row_count.saturating_sub(1))
}

/// Applies ordered samples to a [`UiShell`].
#[derive(Debug, Clone)]
pub struct RefreshController {
    row_limit: usize,
}

impl Default for RefreshController {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RefreshController {
    /// Create a controller showing at most `row_limit` rows (0 = all).
    #[must_use]
    pub fn new(row_limit: usize) -> Self {
        Self { row_limit }
    }

    /// Row cap.
    pub fn row_limit(&self) -> usize {
        self.row_limit
    }

    /// Rebuild the shell's table from `ordered` (already filtered and
    /// sorted), where `total` is the unfiltered process count.
    pub fn refresh(
        &self,
        shell: &mut dyn UiShell,
        ordered: &[ProcessSample],
        total: usize,
    ) -> (Rebuild, StatusSummary) {
        let prior_selection = shell.selection();
        let prior_scroll = shell.scroll_offset();

        let rebuilt = rebuild(ordered, &prior_selection, self.row_limit);

        shell.begin_batch();
        shell.set_rows(&rebuilt.rows);
        shell.set_selection(&rebuilt.selection);
        shell.end_batch();
        shell.set_scroll_offset(clamp_scroll(prior_scroll, rebuilt.rows.len()));

        let dropped = prior_selection.len() - rebuilt.selection.len();
        if dropped > 0 {
            tracing::debug!(dropped, "stale pids dropped from selection");
        }

        let summary = StatusSummary {
            shown: rebuilt.rows.len(),
            matched: ordered.len(),
            total,
        };
        (rebuilt, summary)
    }
}
