//! Refresh scheduler: the single writer of [`DashboardState`].
//!
//! One event-loop thread owns the periodic timer and all state mutation.
//! Everything else talks to it through [`Event`]s:
//!
//! - `RefreshRequested(trigger)` from mount, the timer, or a manual refresh
//! - `RefreshCompleted` from the worker thread that ran the fetch
//! - `Shutdown` from [`RefreshScheduler::shutdown`] or drop
//!
//! Only one fetch counts at a time. A trigger that arrives while a fetch is
//! in flight is dropped, unless that fetch has been running for a full
//! interval. Then it is treated as stalled and the trigger starts a new
//! cycle. Each cycle carries a generation and only the latest one may apply
//! its result. After shutdown the event loop is gone, so a late completion
//! has nowhere to land and is discarded.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{Local, Utc};

use super::source::PriceSource;
use super::state::{DashboardState, RefreshOutcome, Trigger};
use crate::analytics::logger::{EventLog, RefreshLogEntry};

/// Default period between timer-driven refreshes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Messages handled by the event loop.
#[derive(Debug)]
enum Event {
    RefreshRequested(Trigger),
    RefreshCompleted {
        generation: u64,
        trigger: Trigger,
        outcome: RefreshOutcome,
        started: Instant,
    },
    Shutdown,
}

/// Cloneable read/trigger access to a running scheduler.
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    state: Arc<RwLock<DashboardState>>,
    tx: Sender<Event>,
}

impl DashboardHandle {
    /// Copy of the current state.
    pub fn snapshot(&self) -> DashboardState {
        read_state(&self.state).clone()
    }

    /// Ask for a manual refresh. Returns `false` once the scheduler has stopped.
    pub fn request_refresh(&self) -> bool {
        self.tx.send(Event::RefreshRequested(Trigger::Manual)).is_ok()
    }
}

/// Owns the event loop and its periodic timer.
pub struct RefreshScheduler {
    handle: DashboardHandle,
    worker: Option<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Start the loop and immediately request the mount refresh.
    pub fn start(source: Arc<dyn PriceSource>, interval: Duration, log: EventLog) -> Self {
        let state = Arc::new(RwLock::new(DashboardState::default()));
        let (tx, rx) = mpsc::channel();

        let event_loop = EventLoop {
            state: Arc::clone(&state),
            tx: tx.clone(),
            source,
            interval,
            log,
            running_since: None,
        };

        // Queued before the loop starts so mount is always the first cycle.
        let _ = tx.send(Event::RefreshRequested(Trigger::Mount));
        let worker = thread::spawn(move || event_loop.run(rx));

        Self {
            handle: DashboardHandle { state, tx },
            worker: Some(worker),
        }
    }

    pub fn handle(&self) -> DashboardHandle {
        self.handle.clone()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.handle.snapshot()
    }

    pub fn request_refresh(&self) -> bool {
        self.handle.request_refresh()
    }

    /// Stop the timer and the event loop, waiting for the loop to exit.
    ///
    /// An in-flight fetch is not interrupted; its result is discarded.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        let _ = self.handle.tx.send(Event::Shutdown);
        let _ = worker.join();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

struct EventLoop {
    state: Arc<RwLock<DashboardState>>,
    tx: Sender<Event>,
    source: Arc<dyn PriceSource>,
    interval: Duration,
    log: EventLog,
    /// Start of the cycle that currently counts.
    running_since: Option<Instant>,
}

impl EventLoop {
    fn run(mut self, rx: mpsc::Receiver<Event>) {
        let mut next_tick = Instant::now() + self.interval;

        loop {
            let wait = next_tick.saturating_duration_since(Instant::now());
            match rx.recv_timeout(wait) {
                Ok(Event::RefreshRequested(trigger)) => self.begin(trigger),
                Ok(Event::RefreshCompleted {
                    generation,
                    trigger,
                    outcome,
                    started,
                }) => self.complete(generation, trigger, outcome, started),
                Ok(Event::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    next_tick = Instant::now() + self.interval;
                    self.begin(Trigger::Timer);
                }
            }
        }
    }

    fn begin(&mut self, trigger: Trigger) {
        let stalled = self
            .running_since
            .is_some_and(|since| since.elapsed() >= self.interval);

        let generation = {
            let mut state = write_state(&self.state);
            match state.begin_refresh(trigger) {
                Some(generation) => generation,
                None if stalled => state.supersede(trigger),
                None => {
                    drop(state);
                    self.log.server_event(&format!(
                        "refresh trigger={trigger} dropped: fetch in flight"
                    ));
                    return;
                }
            }
        };
        if stalled {
            self.log.server_event(&format!(
                "refresh trigger={trigger} superseded a fetch stalled for over {}s",
                self.interval.as_secs_f64()
            ));
        }

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let started = Instant::now();
        self.running_since = Some(started);
        thread::spawn(move || {
            let outcome = source.fetch_prices();
            // Fails only after shutdown; the result is stale by then.
            let _ = tx.send(Event::RefreshCompleted {
                generation,
                trigger,
                outcome,
                started,
            });
        });
    }

    fn complete(
        &mut self,
        generation: u64,
        trigger: Trigger,
        outcome: RefreshOutcome,
        started: Instant,
    ) {
        let entry = RefreshLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            trigger: trigger.to_string(),
            success: outcome.is_ok(),
            coin_count: outcome.as_ref().map(Vec::len).unwrap_or(0),
            error: outcome.as_ref().err().map(ToString::to_string),
            latency_ms: started.elapsed().as_millis() as u64,
        };

        let applied = write_state(&self.state).apply(generation, outcome, Local::now());
        if !applied {
            self.log.server_event(&format!(
                "refresh trigger={trigger} generation={generation} discarded: superseded"
            ));
            return;
        }
        self.running_since = None;
        self.log.record_refresh(&entry);
    }
}

fn read_state(lock: &RwLock<DashboardState>) -> RwLockReadGuard<'_, DashboardState> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_state(lock: &RwLock<DashboardState>) -> RwLockWriteGuard<'_, DashboardState> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
