//! Interactive and headless drivers.
//!
//! Threads in interactive mode:
//! - UI (this loop): owns the [`Monitor`] and the [`TerminalShell`]
//! - `tasktop-sampler`: owns the inspector, one capture per tick
//! - `tasktop-input`: forwards terminal events

use crate::error::TerminalError;
use crate::frame::Frame;
use crate::input::{InputHandler, TerminalEvent};
use crate::keys::map_key;
use crate::shell::{TerminalShell, TextEntryOutcome};
use crossterm::{cursor, execute, terminal};
use serde::Serialize;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};
use tasktop_core::{
    filter, CaptureResult, CaptureScheduler, FilterState, GamepadAdapter, GamepadSource,
    InputCommand, InputSource, Key, MemorySample, Monitor, NavigationEvent, ProcessInspector,
    RefreshController, Row, Sampler, SettingsProvider, Snapshot, TerminationService, UiShell,
};

/// Longest the UI loop sleeps between passes.
const MAX_IDLE: Duration = Duration::from_millis(16);

/// Interactive run settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Capture interval.
    pub refresh: Duration,
    /// Input and gamepad polling interval.
    pub poll: Duration,
}

/// A gamepad device and the adapter that interprets it.
pub struct Gamepad {
    source: Box<dyn GamepadSource>,
    adapter: GamepadAdapter,
}

impl Gamepad {
    /// Pair a device with an adapter.
    pub fn new(source: Box<dyn GamepadSource>, adapter: GamepadAdapter) -> Self {
        Self { source, adapter }
    }
}

/// UI-thread state: the engine, its shell and an optional gamepad.
pub struct App<S, T> {
    monitor: Monitor<S, T>,
    shell: TerminalShell,
    gamepad: Option<Gamepad>,
}

impl<S: SettingsProvider, T: TerminationService> App<S, T> {
    /// Attach `monitor` to a fresh shell.
    pub fn new(mut monitor: Monitor<S, T>, color: bool) -> Self {
        let mut shell = TerminalShell::new(color);
        monitor.attach(&mut shell);
        Self {
            monitor,
            shell,
            gamepad: None,
        }
    }

    /// Drive the engine from a gamepad as well as the keyboard.
    ///
    /// This is the only way gamepad input reaches the app. The crate ships
    /// no device backend, so the `tasktop` binary runs keyboard-only; a
    /// host with a controller library wraps it in a [`GamepadSource`] and
    /// passes it here.
    #[must_use]
    pub fn with_gamepad(mut self, gamepad: Gamepad) -> Self {
        self.gamepad = Some(gamepad);
        self
    }

    /// The engine.
    pub fn monitor(&self) -> &Monitor<S, T> {
        &self.monitor
    }

    /// The shell.
    pub fn shell(&self) -> &TerminalShell {
        &self.shell
    }

    /// Apply a finished capture.
    pub fn apply_capture(&mut self, result: CaptureResult) {
        self.monitor.apply_capture(&mut self.shell, result);
    }

    /// Handle one terminal event. Returns `true` to quit.
    ///
    /// An open message swallows the next key; an open text entry prompt
    /// takes keys until it is accepted or cancelled.
    pub fn handle_event(&mut self, event: &TerminalEvent) -> bool {
        let key_event = match event {
            TerminalEvent::Resize(..) => {
                self.shell.invalidate();
                return false;
            }
            TerminalEvent::Key(key) => key,
        };
        let Some(key) = map_key(key_event) else {
            return false;
        };

        if self.shell.has_message() {
            self.shell.dismiss_message();
            return false;
        }

        if self.shell.text_entry_active() {
            self.text_entry_key(key);
            return false;
        }

        self.monitor.handle_key(&mut self.shell, key)
    }

    fn text_entry_key(&mut self, key: Key) {
        if let TextEntryOutcome::Commit(text) = self.shell.text_entry_key(key) {
            self.monitor.set_search_query(&mut self.shell, &text);
        }
    }

    /// Poll the gamepad once. Returns `true` to quit.
    pub fn poll_gamepad(&mut self) -> bool {
        let Some(pad) = self.gamepad.as_mut() else {
            return false;
        };
        let state = pad.source.poll();
        let commands = pad.adapter.update(state.as_ref());
        for command in commands {
            if self.shell.has_message() {
                self.shell.dismiss_message();
                continue;
            }
            // The prompt the gamepad opened takes Confirm and Cancel;
            // directions and selection toggles are dropped while it is up.
            if self.shell.text_entry_active() {
                match command {
                    InputCommand::Navigate(NavigationEvent::Confirm) => {
                        self.text_entry_key(Key::Enter);
                    }
                    InputCommand::Navigate(NavigationEvent::Cancel) => {
                        self.text_entry_key(Key::Esc);
                    }
                    _ => {}
                }
                continue;
            }
            if self
                .monitor
                .handle_command(&mut self.shell, command, InputSource::Gamepad)
            {
                return true;
            }
        }
        false
    }

    /// Redraw if anything changed.
    pub fn draw<W: Write>(&mut self, out: &mut W, width: u16, height: u16) -> io::Result<()> {
        if self.shell.is_dirty() {
            self.shell.draw(out, width, height)?;
        }
        Ok(())
    }

    /// Render without writing.
    pub fn render(&self, width: u16, height: u16) -> Frame {
        self.shell.render(width, height)
    }
}

// =============================================================================
// Interactive
// =============================================================================

/// Restores the terminal when dropped, so an early `?` return still leaves
/// a usable shell behind.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All)
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Run the full-screen monitor until the user quits.
pub fn run_interactive<I, S, T>(
    mut app: App<S, T>,
    sampler: Sampler<I>,
    options: RunOptions,
) -> Result<(), TerminalError>
where
    I: ProcessInspector + 'static,
    S: SettingsProvider,
    T: TerminationService,
{
    let mut scheduler = CaptureScheduler::spawn(sampler)?;
    let guard = TerminalGuard::enter()?;
    let input = InputHandler::spawn(options.poll)?;
    let mut stdout = io::stdout();

    tracing::info!(
        refresh_ms = options.refresh.as_millis() as u64,
        "interactive session started"
    );

    scheduler.tick();
    let mut last_tick = Instant::now();
    let mut last_poll = Instant::now();

    let result = loop {
        let mut quit = input.drain().iter().any(|ev| app.handle_event(ev));
        if !quit && last_poll.elapsed() >= options.poll {
            quit = app.poll_gamepad();
            last_poll = Instant::now();
        }
        if quit {
            break Ok(());
        }
        if input.is_finished() {
            break Err(TerminalError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "terminal input closed",
            )));
        }

        if last_tick.elapsed() >= options.refresh {
            scheduler.tick();
            last_tick = Instant::now();
        }
        while let Some(capture) = scheduler.poll() {
            app.apply_capture(capture);
        }

        let (width, height) = terminal::size()?;
        app.draw(&mut stdout, width, height)?;

        thread::sleep(options.poll.min(MAX_IDLE));
    };

    scheduler.shutdown();
    drop(input);
    drop(guard);
    tracing::info!("interactive session ended");
    result
}

// =============================================================================
// Headless
// =============================================================================

/// Output of a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The table as plain text.
    Table,
    /// JSON document.
    Json,
}

/// Headless run settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnceOptions {
    /// Filters to apply.
    pub filter: FilterState,
    /// Rows to print (0 = all).
    pub row_limit: usize,
    /// Output format.
    pub format: OutputFormat,
    /// Pause between the warm-up capture and the reported one.
    pub warmup: Duration,
    /// Table width in columns.
    pub width: u16,
}

#[derive(Serialize)]
struct Report<'a> {
    memory: &'a MemorySample,
    total: usize,
    matched: usize,
    shown: usize,
    processes: &'a [Row],
}

/// Capture twice so CPU figures have a baseline, then print one table or
/// JSON document to `out`.
pub fn run_once<I, W>(
    sampler: &mut Sampler<I>,
    options: &OnceOptions,
    out: &mut W,
) -> Result<(), TerminalError>
where
    I: ProcessInspector,
    W: Write,
{
    sampler.capture()?;
    thread::sleep(options.warmup);
    let snapshot = sampler.capture()?;
    write_snapshot(&snapshot, options, out)
}

/// Print `snapshot` as a table or JSON document.
pub fn write_snapshot<W: Write>(
    snapshot: &Snapshot,
    options: &OnceOptions,
    out: &mut W,
) -> Result<(), TerminalError> {
    let ordered = filter::apply(snapshot, &options.filter);
    let mut shell = TerminalShell::new(false);
    shell.set_memory(&snapshot.memory);
    let (rebuilt, summary) = RefreshController::new(options.row_limit).refresh(
        &mut shell,
        &ordered,
        snapshot.len(),
    );

    match options.format {
        OutputFormat::Json => {
            let report = Report {
                memory: &snapshot.memory,
                total: summary.total,
                matched: summary.matched,
                shown: summary.shown,
                processes: &rebuilt.rows,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
            shell.set_status(&summary.message(&stamp));
            // Every row plus title, filters, header and status.
            let height = (rebuilt.rows.len().max(1) + 4).min(u16::MAX as usize) as u16;
            for line in shell.render(options.width, height).text() {
                writeln!(out, "{}", line.trim_end())?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
