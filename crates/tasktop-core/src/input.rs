//! Device-independent input.
//!
//! The keyboard and gamepad adapters both reduce raw device input to
//! [`InputCommand`]s carrying the same [`NavigationEvent`]s, so the focus
//! and menu navigators never know which device produced them. Device state
//! is polled without blocking; malformed state (unknown buttons, axes out
//! of range, NaN) is dropped by the adapter.
//!
//! Only the gamepad adapter owns a [`RepeatTimer`]: a held hat or stick is
//! seen as the same state on every poll, so the timer turns it into steps.
//! Terminals deliver one key event per OS autorepeat, so the keyboard
//! adapter maps each press to exactly one command.

use crate::focus::FocusRegion;
use crate::repeat::RepeatTimer;
use serde::{Deserialize, Serialize};

/// Normalized navigation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationEvent {
    /// Move up.
    Up,
    /// Move down.
    Down,
    /// Move left.
    Left,
    /// Move right.
    Right,
    /// Activate the focused target.
    Confirm,
    /// Back out.
    Cancel,
}

/// A held direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Up.
    Up,
    /// Down.
    Down,
    /// Left.
    Left,
    /// Right.
    Right,
}

impl From<Direction> for NavigationEvent {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
            Direction::Left => Self::Left,
            Direction::Right => Self::Right,
        }
    }
}

/// Which device produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// Keyboard.
    Keyboard,
    /// Gamepad or joystick.
    Gamepad,
}

/// A command for the monitor, produced by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// Navigation for the focus or menu navigator.
    Navigate(NavigationEvent),
    /// Move the table cursor by a number of rows, clamped at either end.
    Scroll(isize),
    /// Mark or unmark the cursor row.
    ToggleSelection,
    /// Jump focus to the search field.
    FocusSearch,
    /// Jump focus to the next region in the ring.
    NextRegion,
    /// Jump focus to the previous region in the ring.
    PrevRegion,
    /// Append a character to the search text.
    InsertChar(char),
    /// Delete the last search character.
    DeleteChar,
    /// Leave the application.
    Quit,
}

// =============================================================================
// Keyboard
// =============================================================================

/// Keys the keyboard adapter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Page up.
    PageUp,
    /// Page down.
    PageDown,
    /// Home.
    Home,
    /// End.
    End,
    /// Enter / Return.
    Enter,
    /// Escape.
    Esc,
    /// Tab.
    Tab,
    /// Shift-Tab.
    BackTab,
    /// Backspace.
    Backspace,
    /// A printable character.
    Char(char),
    /// A character typed with Ctrl held.
    Ctrl(char),
}

/// Rows moved by Page Up / Page Down.
pub const PAGE_ROWS: isize = 10;

/// Maps key presses to commands for the focused region.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardAdapter;

impl KeyboardAdapter {
    /// Create an adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Translate one key press. In the search field printable keys edit
    /// the query instead of acting as shortcuts.
    pub fn translate(&self, key: Key, region: FocusRegion) -> Option<InputCommand> {
        use InputCommand as C;
        use NavigationEvent as N;

        let typing = region == FocusRegion::SearchField;
        let command = match key {
            Key::Ctrl('c') => C::Quit,
            Key::Up => C::Navigate(N::Up),
            Key::Down => C::Navigate(N::Down),
            Key::Left => C::Navigate(N::Left),
            Key::Right => C::Navigate(N::Right),
            Key::Enter => C::Navigate(N::Confirm),
            Key::Esc => C::Navigate(N::Cancel),
            Key::PageUp => C::Scroll(-PAGE_ROWS),
            Key::PageDown => C::Scroll(PAGE_ROWS),
            Key::Home => C::Scroll(isize::MIN),
            Key::End => C::Scroll(isize::MAX),
            Key::Tab => C::NextRegion,
            Key::BackTab => C::PrevRegion,
            Key::Backspace if typing => C::DeleteChar,
            Key::Char(c) if typing => C::InsertChar(c),
            Key::Char('k') => C::Navigate(N::Up),
            Key::Char('j') => C::Navigate(N::Down),
            Key::Char('h') => C::Navigate(N::Left),
            Key::Char('l') => C::Navigate(N::Right),
            Key::Char(' ') => C::ToggleSelection,
            Key::Char('/') => C::FocusSearch,
            Key::Char('q') => C::Quit,
            _ => return None,
        };
        Some(command)
    }
}

// =============================================================================
// Gamepad
// =============================================================================

/// Button index that confirms.
pub const BUTTON_CONFIRM: usize = 0;
/// Button index that cancels.
pub const BUTTON_CANCEL: usize = 1;
/// Button index that toggles row selection.
pub const BUTTON_TOGGLE: usize = 2;

/// Default stick deadzone.
pub const DEFAULT_DEADZONE: f32 = 0.5;

/// One poll of a gamepad.
///
/// `hat` follows the usual joystick convention: `x` is -1 left / +1 right
/// and `y` is +1 up / -1 down. Stick axis 0 is horizontal and axis 1 is
/// vertical with positive values pointing down.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamepadState {
    /// D-pad / hat position.
    pub hat: (i8, i8),
    /// Analog axes in -1.0..=1.0.
    pub axes: Vec<f32>,
    /// Button pressed flags by index.
    pub buttons: Vec<bool>,
}

impl GamepadState {
    /// State with only a hat position.
    #[must_use]
    pub fn with_hat(x: i8, y: i8) -> Self {
        Self {
            hat: (x, y),
            ..Self::default()
        }
    }

    /// State with only the given buttons pressed.
    #[must_use]
    pub fn with_buttons(pressed: &[usize]) -> Self {
        let len = pressed.iter().max().map_or(0, |m| m + 1);
        let mut buttons = vec![false; len];
        for &b in pressed {
            buttons[b] = true;
        }
        Self {
            buttons,
            ..Self::default()
        }
    }

    fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }
}

/// A non-blocking gamepad backend.
pub trait GamepadSource {
    /// Current state, or `None` when no device is connected.
    fn poll(&mut self) -> Option<GamepadState>;
}

/// Turns polled gamepad state into commands with debounce and repeat.
#[derive(Debug, Clone)]
pub struct GamepadAdapter {
    repeat: RepeatTimer<Direction>,
    deadzone: f32,
    previous: [bool; 3],
}

impl Default for GamepadAdapter {
    fn default() -> Self {
        Self::new(RepeatTimer::default(), DEFAULT_DEADZONE)
    }
}

impl GamepadAdapter {
    /// Create an adapter with the given timer and stick deadzone.
    #[must_use]
    pub fn new(repeat: RepeatTimer<Direction>, deadzone: f32) -> Self {
        let deadzone = if deadzone.is_finite() {
            deadzone.clamp(0.0, 0.95)
        } else {
            DEFAULT_DEADZONE
        };
        Self {
            repeat,
            deadzone,
            previous: [false; 3],
        }
    }

    /// Held direction, hat first then left stick.
    pub fn direction(&self, state: &GamepadState) -> Option<Direction> {
        match state.hat {
            (0, 1) => return Some(Direction::Up),
            (0, -1) => return Some(Direction::Down),
            (-1, 0) => return Some(Direction::Left),
            (1, 0) => return Some(Direction::Right),
            _ => {}
        }

        let axis = |i: usize| {
            state
                .axes
                .get(i)
                .copied()
                .filter(|v| v.is_finite() && (-1.0..=1.0).contains(v))
                .unwrap_or(0.0)
        };
        let (x, y) = (axis(0), axis(1));
        if x.abs() <= self.deadzone && y.abs() <= self.deadzone {
            return None;
        }
        if y.abs() >= x.abs() {
            Some(if y > 0.0 { Direction::Down } else { Direction::Up })
        } else {
            Some(if x > 0.0 { Direction::Right } else { Direction::Left })
        }
    }

    /// Process one poll. Buttons fire on press edges; directions go through
    /// the repeat timer. `None` (device gone) releases everything.
    pub fn update(&mut self, state: Option<&GamepadState>) -> Vec<InputCommand> {
        let Some(state) = state else {
            self.repeat.reset();
            self.previous = [false; 3];
            return Vec::new();
        };

        let mut commands = Vec::new();
        if let Some(dir) = self.repeat.tick(self.direction(state)) {
            commands.push(InputCommand::Navigate(dir.into()));
        }

        let buttons = [BUTTON_CONFIRM, BUTTON_CANCEL, BUTTON_TOGGLE];
        for (slot, &index) in buttons.iter().enumerate() {
            let down = state.button(index);
            if down && !self.previous[slot] {
                commands.push(match index {
                    BUTTON_CONFIRM => InputCommand::Navigate(NavigationEvent::Confirm),
                    BUTTON_CANCEL => InputCommand::Navigate(NavigationEvent::Cancel),
                    _ => InputCommand::ToggleSelection,
                });
            }
            self.previous[slot] = down;
        }
        commands
    }
}
