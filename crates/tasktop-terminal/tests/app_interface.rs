//! App-level tests: crossterm events and a scripted gamepad driving the
//! engine through the real [`TerminalShell`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use tasktop_core::{
    FocusRegion, GamepadAdapter, GamepadSource, GamepadState, InMemorySettings, MemorySample,
    Monitor, ProcessSample, SettingsProvider, Snapshot, TerminateError, TerminationService,
    BUTTON_CANCEL, BUTTON_CONFIRM,
};
use tasktop_terminal::{App, FileSettings, Gamepad, TasktopConfig, TerminalEvent};

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
struct FakeTerminator {
    calls: Vec<u32>,
    outcomes: HashMap<u32, TerminateError>,
}

impl TerminationService for FakeTerminator {
    fn terminate(&mut self, pid: u32) -> Result<(), TerminateError> {
        self.calls.push(pid);
        match self.outcomes.get(&pid) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

struct ScriptedPad {
    states: VecDeque<Option<GamepadState>>,
}

impl ScriptedPad {
    fn new(states: Vec<Option<GamepadState>>) -> Self {
        Self {
            states: states.into(),
        }
    }
}

impl GamepadSource for ScriptedPad {
    fn poll(&mut self) -> Option<GamepadState> {
        self.states.pop_front().flatten()
    }
}

fn snapshot() -> Snapshot {
    Snapshot::new(
        MemorySample::new(8 << 30, 4 << 30, 4 << 30),
        vec![
            ProcessSample::new(1, "init", 10 << 20).with_owner("root"),
            ProcessSample::new(7, "sshd", 20 << 20).with_owner("root"),
            ProcessSample::new(300, "firefox", 900 << 20).with_owner("alice"),
            ProcessSample::new(301, "bash", 5 << 20).with_owner("alice"),
        ],
    )
}

fn press(code: KeyCode) -> TerminalEvent {
    TerminalEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_text<S: SettingsProvider>(app: &mut App<S, FakeTerminator>, text: &str) {
    for c in text.chars() {
        assert!(!app.handle_event(&press(KeyCode::Char(c))));
    }
}

fn app_with<S: SettingsProvider>(settings: S, terminator: FakeTerminator) -> App<S, FakeTerminator> {
    let mut app = App::new(Monitor::new(settings, terminator, 0), false);
    app.apply_capture(Ok(snapshot()));
    app
}

fn app() -> App<InMemorySettings, FakeTerminator> {
    app_with(InMemorySettings::default(), FakeTerminator::default())
}

fn names<S: SettingsProvider>(app: &App<S, FakeTerminator>) -> Vec<String> {
    app.shell().rows().iter().map(|r| r.name.clone()).collect()
}

fn temp_config(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("tasktop-test-{}-{name}", std::process::id()))
        .join("config.yaml")
}

// =============================================================================
// Keyboard
// =============================================================================

mod keyboard {
    use super::*;

    #[test]
    fn test_capture_populates_shell() {
        let app = app();
        assert_eq!(names(&app), ["firefox", "sshd", "init", "bash"]);
        assert!(app.shell().status().contains("Total Processes: 4"));
        assert!(app.render(100, 10).contains("Memory ["));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(app.handle_event(&press(KeyCode::Char('q'))));
        let ctrl_c = TerminalEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.handle_event(&ctrl_c));
    }

    #[test]
    fn test_resize_only_invalidates() {
        let mut app = app();
        let mut sink = Vec::new();
        app.draw(&mut sink, 80, 10).unwrap();
        assert!(!app.shell().is_dirty());
        assert!(!app.handle_event(&TerminalEvent::Resize(120, 40)));
        assert!(app.shell().is_dirty());
    }

    #[test]
    fn test_search_typing_filters_rows() {
        let mut app = app();
        app.handle_event(&press(KeyCode::Char('/')));
        type_text(&mut app, "SH");
        assert_eq!(names(&app), ["sshd", "bash"]);
        // 'q' is text while the search field has focus.
        assert!(!app.handle_event(&press(KeyCode::Char('q'))));
        assert!(app.shell().rows().is_empty());
        app.handle_event(&press(KeyCode::Esc));
        assert_eq!(names(&app).len(), 4);
    }

    #[test]
    fn test_end_task_from_menu() {
        let mut app = app();
        app.handle_event(&press(KeyCode::Down));
        app.handle_event(&press(KeyCode::Enter));
        assert!(app.shell().menu_open());
        assert!(app.render(100, 12).contains("End Task: sshd"));

        app.handle_event(&press(KeyCode::Enter));
        assert!(!app.shell().menu_open());
        assert_eq!(app.monitor().terminator().calls, [7]);
        assert_eq!(app.shell().status(), "Terminated 1 process(es)");
    }

    #[test]
    fn test_selected_rows_end_together() {
        let mut app = app();
        app.handle_event(&press(KeyCode::Char(' ')));
        app.handle_event(&press(KeyCode::Down));
        app.handle_event(&press(KeyCode::Down));
        app.handle_event(&press(KeyCode::Char(' ')));
        app.handle_event(&press(KeyCode::Enter));
        assert!(app.render(100, 12).contains("End 2 Tasks"));
        app.handle_event(&press(KeyCode::Enter));
        assert_eq!(app.monitor().terminator().calls, [300, 1]);
    }

    #[test]
    fn test_menu_escape_closes_without_action() {
        let mut app = app();
        app.handle_event(&press(KeyCode::Enter));
        app.handle_event(&press(KeyCode::Esc));
        assert!(!app.shell().menu_open());
        assert!(app.monitor().terminator().calls.is_empty());
    }

    #[test]
    fn test_failure_message_swallows_next_key() {
        let mut terminator = FakeTerminator::default();
        terminator.outcomes.insert(300, TerminateError::AccessDenied);
        let mut app = app_with(InMemorySettings::default(), terminator);

        app.handle_event(&press(KeyCode::Enter));
        app.handle_event(&press(KeyCode::Enter));
        assert!(app.shell().has_message());
        assert!(app.render(100, 14).contains("firefox (PID: 300)"));

        // Dismissing does not reach the engine, so 'q' does not quit.
        assert!(!app.handle_event(&press(KeyCode::Char('q'))));
        assert!(!app.shell().has_message());
        assert!(app.handle_event(&press(KeyCode::Char('q'))));
    }
}

// =============================================================================
// Gamepad
// =============================================================================

mod gamepad {
    use super::*;

    fn with_pad(states: Vec<Option<GamepadState>>) -> App<InMemorySettings, FakeTerminator> {
        app().with_gamepad(Gamepad::new(
            Box::new(ScriptedPad::new(states)),
            GamepadAdapter::default(),
        ))
    }

    #[test]
    fn test_confirm_in_search_opens_text_entry() {
        let mut app = with_pad(vec![Some(GamepadState::with_buttons(&[BUTTON_CONFIRM]))]);
        app.handle_event(&press(KeyCode::Char('/')));
        assert!(!app.poll_gamepad());
        assert!(app.shell().text_entry_active());

        // Keys now edit the prompt, not the engine.
        type_text(&mut app, "fire");
        assert_eq!(names(&app).len(), 4);
        app.handle_event(&press(KeyCode::Enter));
        assert!(!app.shell().text_entry_active());
        assert_eq!(app.monitor().search_query(), "fire");
        assert_eq!(names(&app), ["firefox"]);
    }

    #[test]
    fn test_text_entry_cancel_keeps_query() {
        let mut app = with_pad(vec![Some(GamepadState::with_buttons(&[BUTTON_CONFIRM]))]);
        app.handle_event(&press(KeyCode::Char('/')));
        app.poll_gamepad();
        type_text(&mut app, "zzz");
        app.handle_event(&press(KeyCode::Esc));
        assert!(!app.shell().text_entry_active());
        assert_eq!(app.monitor().search_query(), "");
        assert_eq!(names(&app).len(), 4);
    }

    #[test]
    fn test_gamepad_confirm_commits_prompt() {
        let mut app = with_pad(vec![
            Some(GamepadState::with_buttons(&[BUTTON_CONFIRM])),
            Some(GamepadState::default()),
            Some(GamepadState::with_buttons(&[BUTTON_CONFIRM])),
        ]);
        app.handle_event(&press(KeyCode::Char('/')));
        app.poll_gamepad();
        type_text(&mut app, "bash");
        app.poll_gamepad();
        assert!(app.shell().text_entry_active());

        app.poll_gamepad();
        assert!(!app.shell().text_entry_active());
        assert_eq!(app.monitor().search_query(), "bash");
        assert_eq!(names(&app), ["bash"]);
    }

    #[test]
    fn test_gamepad_cancel_dismisses_prompt_only() {
        let mut app = with_pad(vec![
            Some(GamepadState::with_buttons(&[BUTTON_CONFIRM])),
            Some(GamepadState::with_hat(0, 1)),
            Some(GamepadState::with_buttons(&[BUTTON_CANCEL])),
        ]);
        app.handle_event(&press(KeyCode::Char('/')));
        type_text(&mut app, "sh");
        app.poll_gamepad();
        assert!(app.shell().text_entry_active());

        // Directions are dropped while the prompt is up.
        app.poll_gamepad();
        assert!(app.shell().text_entry_active());
        assert_eq!(app.monitor().focus().region(), FocusRegion::SearchField);

        app.poll_gamepad();
        assert!(!app.shell().text_entry_active());
        assert_eq!(app.monitor().search_query(), "sh");
        assert_eq!(app.monitor().focus().region(), FocusRegion::SearchField);
        assert_eq!(names(&app), ["sshd", "bash"]);
    }

    #[test]
    fn test_hat_moves_cursor() {
        let mut app = with_pad(vec![Some(GamepadState::with_hat(0, -1)), None]);
        app.poll_gamepad();
        assert_eq!(app.monitor().focus().row(), 1);
        // Disconnected pad does nothing.
        assert!(!app.poll_gamepad());
        assert_eq!(app.monitor().focus().row(), 1);
    }

    #[test]
    fn test_no_gamepad_is_noop() {
        let mut app = app();
        assert!(!app.poll_gamepad());
    }
}

// =============================================================================
// Settings persistence
// =============================================================================

mod settings {
    use super::*;

    #[test]
    fn test_checkbox_writes_config_file() {
        let path = temp_config("checkbox");
        let settings = FileSettings::new(&path, &TasktopConfig::default());
        let mut app = app_with(settings, FakeTerminator::default());

        app.handle_event(&press(KeyCode::Tab));
        app.handle_event(&press(KeyCode::Enter));
        assert_eq!(names(&app), ["firefox", "bash"]);
        assert!(app.monitor().settings().hide_system_processes());

        let saved = TasktopConfig::load_from_file(&path).unwrap();
        assert!(saved.hide_system_processes);
        assert!(!saved.hide_inaccessible_processes);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_saved_toggles_restore_filters() {
        let mut config = TasktopConfig::default();
        config.hide_system_processes = true;
        let path = temp_config("restore");
        let app = app_with(FileSettings::new(&path, &config), FakeTerminator::default());
        assert_eq!(names(&app), ["firefox", "bash"]);
        assert!(app.render(100, 10).contains("[x] Hide system processes"));
    }

    #[test]
    fn test_write_back_leaves_other_keys_alone() {
        let path = temp_config("overrides");
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(&path, "# tuned by hand\nrefresh_ms: 2000\nrow_limit: 50\n").unwrap();

        // One-run overrides as the command line applies them.
        let mut config = TasktopConfig::load_from_file(&path).unwrap();
        config.refresh_ms = 100;
        config.row_limit = 5;
        config.hide_inaccessible_processes = true;
        let mut app = app_with(FileSettings::new(&path, &config), FakeTerminator::default());

        app.handle_event(&press(KeyCode::Tab));
        app.handle_event(&press(KeyCode::Enter));
        assert!(app.monitor().settings().hide_system_processes());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# tuned by hand\n"));
        let saved = TasktopConfig::parse_yaml(&text).unwrap();
        assert_eq!(saved.refresh_ms, 2000);
        assert_eq!(saved.row_limit, 50);
        assert!(saved.hide_system_processes);
        assert!(!saved.hide_inaccessible_processes);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_broken_file_is_not_overwritten() {
        let path = temp_config("broken");
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).unwrap();
        }
        std::fs::write(&path, "row_limit: fifty\n").unwrap();
        assert!(TasktopConfig::load_from_file(&path).is_err());

        let settings = FileSettings::new(&path, &TasktopConfig::default());
        let mut app = app_with(settings, FakeTerminator::default());
        app.handle_event(&press(KeyCode::Tab));
        app.handle_event(&press(KeyCode::Enter));

        assert!(app.monitor().settings().hide_system_processes());
        assert!(app.shell().status().starts_with("settings not saved"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "row_limit: fifty\n");

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_unwritable_path_keeps_value_and_reports() {
        let blocker = std::env::temp_dir().join(format!("tasktop-test-{}-file", std::process::id()));
        std::fs::write(&blocker, "not a directory").unwrap();
        let settings = FileSettings::new(blocker.join("config.yaml"), &TasktopConfig::default());
        let mut app = app_with(settings, FakeTerminator::default());

        app.handle_event(&press(KeyCode::Tab));
        app.handle_event(&press(KeyCode::Enter));
        assert!(app.monitor().settings().hide_system_processes());
        assert!(app.shell().status().starts_with("settings not saved"));

        let _ = std::fs::remove_file(&blocker);
    }
}
