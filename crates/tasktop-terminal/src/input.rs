//! Dedicated input thread.
//!
//! Terminal events are read on their own thread so key handling stays
//! responsive while the UI thread draws.
//!
//! ```text
//! ┌──────────────────┐     mpsc::channel      ┌──────────────────┐
//! │   Input Thread   │ ────────────────────▶  │     UI Thread    │
//! │                  │   TerminalEvent queue  │                  │
//! │  event::poll()   │                        │  drain()         │
//! │  event::read()   │                        │  draw()          │
//! └──────────────────┘                        └──────────────────┘
//!      poll_ms                                     refresh_ms
//! ```

use crate::error::TerminalError;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long [`Drop`] waits for the thread to notice shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// An event forwarded from the input thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A key press.
    Key(KeyEvent),
    /// The terminal changed size.
    Resize(u16, u16),
}

/// Threaded terminal event reader.
pub struct InputHandler {
    rx: Receiver<TerminalEvent>,
    shutdown: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl InputHandler {
    /// Spawn the input thread, polling every `poll`.
    pub fn spawn(poll: Duration) -> Result<Self, TerminalError> {
        let (tx, rx) = mpsc::channel();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = Arc::clone(&shutdown);

        let thread_handle = thread::Builder::new()
            .name("tasktop-input".to_string())
            .spawn(move || Self::input_loop(&tx, &shutdown_clone, poll))?;

        Ok(Self {
            rx,
            shutdown,
            thread_handle: Some(thread_handle),
        })
    }

    fn input_loop(tx: &Sender<TerminalEvent>, shutdown: &AtomicBool, poll: Duration) {
        while !shutdown.load(Ordering::Relaxed) {
            match event::poll(poll) {
                Ok(true) => {
                    let forwarded = match event::read() {
                        // Release and repeat events are reported by some
                        // platforms; only presses drive the UI.
                        Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            Some(TerminalEvent::Key(key))
                        }
                        Ok(Event::Resize(w, h)) => Some(TerminalEvent::Resize(w, h)),
                        Ok(_) => None,
                        Err(err) => {
                            tracing::warn!(%err, "terminal read failed, input thread exiting");
                            break;
                        }
                    };
                    if let Some(ev) = forwarded {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(%err, "terminal poll failed, input thread exiting");
                    break;
                }
            }
        }
        tracing::debug!("input thread exiting");
    }

    /// Take one pending event without blocking.
    pub fn try_recv(&self) -> Option<TerminalEvent> {
        match self.rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// All pending events in arrival order.
    pub fn drain(&self) -> Vec<TerminalEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Whether the input thread has stopped.
    pub fn is_finished(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }

    /// Signal the input thread to stop.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for InputHandler {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.thread_handle.take() {
            let start = Instant::now();
            while !handle.is_finished() && start.elapsed() < SHUTDOWN_GRACE {
                thread::sleep(Duration::from_millis(5));
            }
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}
