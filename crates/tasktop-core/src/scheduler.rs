//! Single-flight background capture.
//!
//! The UI thread owns the scheduler and calls [`CaptureScheduler::tick`] on
//! every timer fire. A worker thread owns the [`Sampler`] and runs one
//! capture per request. A tick while a capture is outstanding is a no-op,
//! so results arrive in issue order and at most one capture ever runs.
//!
//! ```text
//! ┌──────────────────┐   request (unit)   ┌──────────────────┐
//! │    UI thread     │ ─────────────────▶ │  Sampler thread  │
//! │  tick() / poll() │ ◀───────────────── │    capture()     │
//! └──────────────────┘  Result<Snapshot>  └──────────────────┘
//! ```
//!
//! After [`CaptureScheduler::shutdown`] a capture still running is allowed
//! to finish, but its result is dropped and never reaches the UI.

use crate::error::{CaptureError, SchedulerError};
use crate::sample::Snapshot;
use crate::sampler::Sampler;
use crate::traits::ProcessInspector;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Result of one capture as delivered to the UI thread.
pub type CaptureResult = Result<Snapshot, CaptureError>;

/// How long [`Drop`] waits for the worker before detaching it.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// The one-boolean guard behind single-flight.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SingleFlight {
    in_flight: bool,
}

impl SingleFlight {
    /// Claim the slot; `false` if a capture is already outstanding.
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            false
        } else {
            self.in_flight = true;
            true
        }
    }

    /// Release the slot.
    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    /// Whether a capture is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new capture was requested.
    Started,
    /// A capture is still outstanding; nothing was requested.
    Skipped,
    /// The scheduler is shut down or the worker has gone.
    Stopped,
}

/// Runs captures off the UI thread, one at a time.
pub struct CaptureScheduler {
    request_tx: Option<Sender<()>>,
    result_rx: Receiver<CaptureResult>,
    guard: SingleFlight,
    stopped: bool,
    worker: Option<JoinHandle<()>>,
}

impl CaptureScheduler {
    /// Spawn the sampler worker.
    pub fn spawn<I>(sampler: Sampler<I>) -> Result<Self, SchedulerError>
    where
        I: ProcessInspector + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<()>();
        let (result_tx, result_rx) = mpsc::channel::<CaptureResult>();

        let worker = thread::Builder::new()
            .name("tasktop-sampler".to_string())
            .spawn(move || Self::worker_loop(sampler, &request_rx, &result_tx))?;

        Ok(Self {
            request_tx: Some(request_tx),
            result_rx,
            guard: SingleFlight::default(),
            stopped: false,
            worker: Some(worker),
        })
    }

    fn worker_loop<I: ProcessInspector>(
        mut sampler: Sampler<I>,
        requests: &Receiver<()>,
        results: &Sender<CaptureResult>,
    ) {
        // Exits when the UI drops the request sender.
        while requests.recv().is_ok() {
            let result = sampler.capture();
            if results.send(result).is_err() {
                break;
            }
        }
        tracing::debug!("sampler worker exiting");
    }

    /// Request a capture unless one is already in flight.
    pub fn tick(&mut self) -> TickOutcome {
        if self.stopped {
            return TickOutcome::Stopped;
        }
        if !self.guard.try_begin() {
            tracing::trace!("capture in flight, tick skipped");
            return TickOutcome::Skipped;
        }
        let sent = self
            .request_tx
            .as_ref()
            .is_some_and(|tx| tx.send(()).is_ok());
        if sent {
            TickOutcome::Started
        } else {
            self.guard.finish();
            self.stopped = true;
            tracing::warn!("sampler worker is gone");
            TickOutcome::Stopped
        }
    }

    /// Take a finished capture without blocking.
    pub fn poll(&mut self) -> Option<CaptureResult> {
        if self.stopped {
            return None;
        }
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.guard.finish();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.guard.finish();
                self.stopped = true;
                None
            }
        }
    }

    /// Wait up to `timeout` for the outstanding capture.
    pub fn wait(&mut self, timeout: Duration) -> Option<CaptureResult> {
        if self.stopped || !self.guard.is_in_flight() {
            return None;
        }
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.guard.finish();
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.guard.finish();
                self.stopped = true;
                None
            }
        }
    }

    /// Whether a capture is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.guard.is_in_flight()
    }

    /// Whether the scheduler has stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Stop issuing captures. An outstanding capture finishes on the worker
    /// but its result is discarded.
    pub fn shutdown(&mut self) {
        if self.stopped && self.request_tx.is_none() {
            return;
        }
        self.stopped = true;
        self.request_tx = None;
        if self.guard.is_in_flight() {
            tracing::debug!("discarding in-flight capture on shutdown");
        }
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.worker.take() {
            let start = Instant::now();
            while !handle.is_finished() && start.elapsed() < SHUTDOWN_GRACE {
                thread::sleep(Duration::from_millis(5));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                tracing::warn!("sampler worker still capturing at shutdown, detaching");
            }
        }
    }
}
