//! Focus navigation state machine.
//!
//! Focus lives in exactly one region at a time. Vertical movement walks a
//! fixed ring:
//!
//! ```text
//! Table(bottom) -> CheckboxA -> CheckboxB -> SearchField -> Table(top)
//! ```
//!
//! and `Up` walks it in reverse. Inside the table, vertical movement moves
//! the row cursor until it runs off either end.

use crate::input::NavigationEvent;
use serde::{Deserialize, Serialize};

/// A focusable region of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FocusRegion {
    /// Process table.
    Table,
    /// First filter toggle (hide system processes).
    CheckboxA,
    /// Second filter toggle (hide inaccessible processes).
    CheckboxB,
    /// Search text field.
    SearchField,
}

impl FocusRegion {
    /// All regions in ring order.
    pub fn all() -> &'static [Self] {
        &[Self::Table, Self::CheckboxA, Self::CheckboxB, Self::SearchField]
    }

    /// Next region in the ring.
    pub fn next(self) -> Self {
        match self {
            Self::Table => Self::CheckboxA,
            Self::CheckboxA => Self::CheckboxB,
            Self::CheckboxB => Self::SearchField,
            Self::SearchField => Self::Table,
        }
    }

    /// Previous region in the ring.
    pub fn prev(self) -> Self {
        match self {
            Self::Table => Self::SearchField,
            Self::CheckboxA => Self::Table,
            Self::CheckboxB => Self::CheckboxA,
            Self::SearchField => Self::CheckboxB,
        }
    }

    /// The filter toggle behind this region, if it is a checkbox.
    pub fn checkbox(self) -> Option<Checkbox> {
        match self {
            Self::CheckboxA => Some(Checkbox::HideSystem),
            Self::CheckboxB => Some(Checkbox::HideInaccessible),
            _ => None,
        }
    }
}

/// Filter toggles shown as checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Checkbox {
    /// Hide system processes.
    HideSystem,
    /// Hide inaccessible processes.
    HideInaccessible,
}

impl Checkbox {
    /// Region hosting this checkbox.
    pub fn region(self) -> FocusRegion {
        match self {
            Self::HideSystem => FocusRegion::CheckboxA,
            Self::HideInaccessible => FocusRegion::CheckboxB,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::HideSystem => "Hide system processes",
            Self::HideInaccessible => "Hide inaccessible processes",
        }
    }
}

/// Current focus: a region plus the table row cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusState {
    /// Focused region.
    pub region: FocusRegion,
    /// Row cursor, meaningful while the table has rows.
    pub row: usize,
}

/// What a navigation event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEffect {
    /// Nothing changed.
    None,
    /// Focus moved between regions.
    Moved {
        /// Region that lost focus.
        from: FocusRegion,
        /// Region that gained focus.
        to: FocusRegion,
    },
    /// The table row cursor moved.
    RowChanged(usize),
    /// Confirm on the table: open the context menu.
    OpenMenu,
    /// Confirm on a checkbox: flip it.
    Toggle(Checkbox),
    /// Confirm on the search field; text entry belongs to the input adapter.
    SearchConfirmed,
    /// Cancel: search text cleared and focus returned to the table.
    ClearSearch {
        /// Region that lost focus (may already be the table).
        from: FocusRegion,
    },
}

/// Owns [`FocusState`] and applies [`NavigationEvent`]s to it.
#[derive(Debug, Clone)]
pub struct FocusNavigator {
    state: FocusState,
    row_count: usize,
}

impl Default for FocusNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusNavigator {
    /// Start focused on the first table row.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: FocusState {
                region: FocusRegion::Table,
                row: 0,
            },
            row_count: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> FocusState {
        self.state
    }

    /// Focused region.
    pub fn region(&self) -> FocusRegion {
        self.state.region
    }

    /// Table row cursor.
    pub fn row(&self) -> usize {
        self.state.row
    }

    /// Number of table rows the cursor may visit.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Update the table size after a refresh, clamping the cursor.
    pub fn set_row_count(&mut self, count: usize) {
        self.row_count = count;
        self.state.row = self.state.row.min(count.saturating_sub(1));
    }

    /// Place the row cursor, clamped.
    pub fn set_row(&mut self, row: usize) -> FocusEffect {
        let row = row.min(self.row_count.saturating_sub(1));
        if row == self.state.row {
            FocusEffect::None
        } else {
            self.state.row = row;
            FocusEffect::RowChanged(row)
        }
    }

    /// Jump straight to a region.
    pub fn focus(&mut self, region: FocusRegion) -> FocusEffect {
        self.move_to(region)
    }

    /// Regions with their highlight flag; exactly one is `true`.
    pub fn highlights(&self) -> [(FocusRegion, bool); 4] {
        let current = self.state.region;
        [
            (FocusRegion::Table, current == FocusRegion::Table),
            (FocusRegion::CheckboxA, current == FocusRegion::CheckboxA),
            (FocusRegion::CheckboxB, current == FocusRegion::CheckboxB),
            (FocusRegion::SearchField, current == FocusRegion::SearchField),
        ]
    }

    /// Apply one navigation event.
    pub fn handle(&mut self, event: NavigationEvent) -> FocusEffect {
        let region = self.state.region;
        match (event, region) {
            (NavigationEvent::Down, FocusRegion::Table) => {
                if self.state.row + 1 < self.row_count {
                    self.state.row += 1;
                    FocusEffect::RowChanged(self.state.row)
                } else {
                    self.move_to(FocusRegion::CheckboxA)
                }
            }
            (NavigationEvent::Up, FocusRegion::Table) => {
                if self.state.row > 0 && self.row_count > 0 {
                    self.state.row -= 1;
                    FocusEffect::RowChanged(self.state.row)
                } else {
                    self.move_to(FocusRegion::SearchField)
                }
            }
            (NavigationEvent::Down, FocusRegion::SearchField) => {
                self.state.row = 0;
                self.move_to(FocusRegion::Table)
            }
            (NavigationEvent::Up, FocusRegion::CheckboxA) => {
                self.state.row = self.row_count.saturating_sub(1);
                self.move_to(FocusRegion::Table)
            }
            (NavigationEvent::Down, _) => self.move_to(region.next()),
            (NavigationEvent::Up, _) => self.move_to(region.prev()),

            (NavigationEvent::Right, FocusRegion::CheckboxA) => {
                self.move_to(FocusRegion::CheckboxB)
            }
            (NavigationEvent::Left, FocusRegion::CheckboxB) => {
                self.move_to(FocusRegion::CheckboxA)
            }
            (NavigationEvent::Left | NavigationEvent::Right, _) => FocusEffect::None,

            (NavigationEvent::Confirm, FocusRegion::Table) => FocusEffect::OpenMenu,
            (NavigationEvent::Confirm, FocusRegion::SearchField) => FocusEffect::SearchConfirmed,
            (NavigationEvent::Confirm, _) => region
                .checkbox()
                .map_or(FocusEffect::None, FocusEffect::Toggle),

            (NavigationEvent::Cancel, _) => {
                self.state.region = FocusRegion::Table;
                FocusEffect::ClearSearch { from: region }
            }
        }
    }

    fn move_to(&mut self, region: FocusRegion) -> FocusEffect {
        let from = self.state.region;
        if from == region {
            return FocusEffect::None;
        }
        self.state.region = region;
        FocusEffect::Moved { from, to: region }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn nav_with_rows(rows: usize) -> FocusNavigator {
        let mut nav = FocusNavigator::new();
        nav.set_row_count(rows);
        nav
    }

    #[test]
    fn test_down_moves_cursor_inside_table() {
        let mut nav = nav_with_rows(3);
        assert_eq!(nav.handle(NavigationEvent::Down), FocusEffect::RowChanged(1));
        assert_eq!(nav.region(), FocusRegion::Table);
    }

    #[test]
    fn test_ring_closes_after_four_transitions() {
        let mut nav = nav_with_rows(3);
        nav.set_row(2);
        let mut regions = Vec::new();
        for _ in 0..4 {
            match nav.handle(NavigationEvent::Down) {
                FocusEffect::Moved { to, .. } => regions.push(to),
                other => panic!("expected region move, got {other:?}"),
            }
        }
        assert_eq!(
            regions,
            vec![
                FocusRegion::CheckboxA,
                FocusRegion::CheckboxB,
                FocusRegion::SearchField,
                FocusRegion::Table
            ]
        );
        assert_eq!(nav.row(), 0);
    }

    #[test]
    fn test_up_is_reverse_ring() {
        let mut nav = nav_with_rows(5);
        assert_eq!(
            nav.handle(NavigationEvent::Up),
            FocusEffect::Moved {
                from: FocusRegion::Table,
                to: FocusRegion::SearchField
            }
        );
        nav.handle(NavigationEvent::Up);
        assert_eq!(nav.region(), FocusRegion::CheckboxB);
        nav.handle(NavigationEvent::Up);
        assert_eq!(nav.region(), FocusRegion::CheckboxA);
        nav.handle(NavigationEvent::Up);
        assert_eq!(nav.region(), FocusRegion::Table);
        assert_eq!(nav.row(), 4);
    }

    #[test]
    fn test_empty_table_passes_through() {
        let mut nav = nav_with_rows(0);
        nav.handle(NavigationEvent::Down);
        assert_eq!(nav.region(), FocusRegion::CheckboxA);
        nav.handle(NavigationEvent::Up);
        assert_eq!(nav.region(), FocusRegion::Table);
        assert_eq!(nav.row(), 0);
    }

    #[test]
    fn test_left_right_only_between_checkboxes() {
        let mut nav = nav_with_rows(2);
        assert_eq!(nav.handle(NavigationEvent::Right), FocusEffect::None);
        nav.focus(FocusRegion::CheckboxA);
        nav.handle(NavigationEvent::Right);
        assert_eq!(nav.region(), FocusRegion::CheckboxB);
        assert_eq!(nav.handle(NavigationEvent::Right), FocusEffect::None);
        nav.handle(NavigationEvent::Left);
        assert_eq!(nav.region(), FocusRegion::CheckboxA);
        nav.focus(FocusRegion::SearchField);
        assert_eq!(nav.handle(NavigationEvent::Left), FocusEffect::None);
    }

    #[test]
    fn test_confirm_per_region() {
        let mut nav = nav_with_rows(1);
        assert_eq!(nav.handle(NavigationEvent::Confirm), FocusEffect::OpenMenu);
        nav.focus(FocusRegion::CheckboxA);
        assert_eq!(
            nav.handle(NavigationEvent::Confirm),
            FocusEffect::Toggle(Checkbox::HideSystem)
        );
        nav.focus(FocusRegion::CheckboxB);
        assert_eq!(
            nav.handle(NavigationEvent::Confirm),
            FocusEffect::Toggle(Checkbox::HideInaccessible)
        );
        nav.focus(FocusRegion::SearchField);
        assert_eq!(
            nav.handle(NavigationEvent::Confirm),
            FocusEffect::SearchConfirmed
        );
        assert_eq!(nav.region(), FocusRegion::SearchField);
    }

    #[test]
    fn test_cancel_returns_to_table() {
        let mut nav = nav_with_rows(4);
        nav.focus(FocusRegion::SearchField);
        assert_eq!(
            nav.handle(NavigationEvent::Cancel),
            FocusEffect::ClearSearch {
                from: FocusRegion::SearchField
            }
        );
        assert_eq!(nav.region(), FocusRegion::Table);
    }

    #[test]
    fn test_set_row_count_clamps_cursor() {
        let mut nav = nav_with_rows(10);
        nav.set_row(9);
        nav.set_row_count(4);
        assert_eq!(nav.row(), 3);
        nav.set_row_count(0);
        assert_eq!(nav.row(), 0);
    }

    #[test]
    fn test_checkbox_region_round_trip() {
        for cb in [Checkbox::HideSystem, Checkbox::HideInaccessible] {
            assert_eq!(cb.region().checkbox(), Some(cb));
        }
        assert_eq!(FocusRegion::Table.checkbox(), None);
    }

    fn arb_event() -> impl Strategy<Value = NavigationEvent> {
        prop::sample::select(vec![
            NavigationEvent::Up,
            NavigationEvent::Down,
            NavigationEvent::Left,
            NavigationEvent::Right,
            NavigationEvent::Confirm,
            NavigationEvent::Cancel,
        ])
    }

    proptest! {
        #[test]
        fn prop_exactly_one_highlight(rows in 0usize..20, events in proptest::collection::vec(arb_event(), 0..60)) {
            let mut nav = nav_with_rows(rows);
            for event in events {
                nav.handle(event);
                let lit = nav.highlights().iter().filter(|(_, on)| *on).count();
                prop_assert_eq!(lit, 1);
                prop_assert!(nav.row() <= rows.saturating_sub(1));
            }
        }

        #[test]
        fn prop_ring_next_prev_inverse(idx in 0usize..4) {
            let region = FocusRegion::all()[idx];
            prop_assert_eq!(region.next().prev(), region);
        }
    }
}
