//! Timer engine for Sharp Timer.
//!
//! This module provides the core timer functionality:
//! - Ownership of the single live [`Session`]
//! - Start / pause / resume / reset / mode-change transitions
//! - Countdown driven by the tick source in [`super::ticker`]
//! - Exactly-once completion delivery per run
//!
//! Every public operation takes the engine lock, so transitions are
//! serialised with each other and with ticks. A tick that was already in
//! flight when the source was disarmed carries a stale epoch and is dropped.
//!
//! Running time that no tick has counted yet survives a pause: it is carried
//! into the next arm by backdating the tick anchor.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::persistence::PersistenceSnapshot;
use crate::types::{Mode, ModeSwitchPolicy, Session};

use super::ticker::{self, TICK_PERIOD};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A new run started
    Started {
        /// Mode of the new run
        mode: Mode,
        /// Full duration of the run
        configured_seconds: u32,
    },
    /// Countdown paused
    Paused,
    /// Countdown resumed
    Resumed,
    /// Session reset to idle
    Reset,
    /// Mode switched
    ModeChanged {
        /// The newly selected mode
        mode: Mode,
        /// Whether the countdown kept running
        running: bool,
    },
    /// Whole seconds were counted down
    Tick {
        /// Remaining seconds
        remaining_seconds: u32,
    },
    /// Countdown reached zero. Sent at most once per run.
    Completed {
        /// Mode that completed
        mode: Mode,
        /// Run number the completion belongs to
        run: u64,
    },
}

// ============================================================================
// EngineError
// ============================================================================

/// Engine construction errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine needs a tokio runtime to drive its tick source
    #[error("timer engine must be created inside a tokio runtime")]
    NoRuntime,
}

/// Callback invoked when a run completes naturally.
pub type CompletionHandler = Arc<dyn Fn(&Session) + Send + Sync>;

// ============================================================================
// TimerEngine
// ============================================================================

struct Inner {
    session: Session,
    policy: ModeSwitchPolicy,
    /// Bumped on every arm and disarm; ticks from an older epoch are stale.
    epoch: u64,
    /// Bumped whenever a new run replaces the session.
    run: u64,
    /// Last run whose completion was delivered.
    completed_run: Option<u64>,
    ticker: Option<JoinHandle<()>>,
    /// Anchor of the armed tick source.
    armed_at: Option<Instant>,
    /// Whole seconds applied since `armed_at`.
    counted: u64,
    /// Uncounted running time kept across a pause.
    carry: Duration,
}

impl Inner {
    fn disarm(&mut self) {
        self.epoch += 1;
        self.armed_at = None;
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    /// Running time since the source was armed that no tick has applied yet.
    fn uncounted(&self) -> Duration {
        self.armed_at.map_or(Duration::ZERO, |at| {
            at.elapsed().saturating_sub(Duration::from_secs(self.counted))
        })
    }

    fn begin_run(&mut self, session: Session) {
        self.disarm();
        self.carry = Duration::ZERO;
        self.run += 1;
        self.session = session;
    }
}

/// State shared by engine handles and the tick task.
struct Shared {
    state: Mutex<Inner>,
    /// Held while the handler runs, so a replacement waits for an in-flight call.
    on_completion: Mutex<Option<CompletionHandler>>,
}

/// Timer engine that owns the live session and its tick source.
///
/// Cloning yields another handle to the same engine.
#[derive(Clone)]
pub struct TimerEngine {
    inner: Arc<Shared>,
    runtime: Handle,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an engine holding an idle Work session at its default duration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoRuntime`] when called outside a tokio runtime.
    pub fn new(event_tx: mpsc::UnboundedSender<TimerEvent>) -> Result<Self, EngineError> {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, event_tx))
    }

    /// Creates an engine that spawns its tick source on `runtime`.
    pub fn with_runtime(runtime: Handle, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        let inner = Inner {
            session: Session::default(),
            policy: ModeSwitchPolicy::default(),
            epoch: 0,
            run: 0,
            completed_run: None,
            ticker: None,
            armed_at: None,
            counted: 0,
            carry: Duration::ZERO,
        };
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(inner),
                on_completion: Mutex::new(None),
            }),
            runtime,
            event_tx,
        }
    }

    /// Sets the mode switch policy used by [`TimerEngine::change_mode`].
    #[must_use]
    pub fn with_policy(self, policy: ModeSwitchPolicy) -> Self {
        self.set_policy(policy);
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Returns a copy of the current session.
    pub fn session(&self) -> Session {
        self.lock().session
    }

    pub fn policy(&self) -> ModeSwitchPolicy {
        self.lock().policy
    }

    /// Returns the current run number.
    pub fn run(&self) -> u64 {
        self.lock().run
    }

    /// Returns true while the tick source is armed.
    pub fn is_ticking(&self) -> bool {
        self.lock().ticker.is_some()
    }

    /// Builds a persistence snapshot of the current session.
    ///
    /// Returns `None` unless the session is Running or Paused.
    pub fn snapshot(&self, saved_at: DateTime<Utc>) -> Option<PersistenceSnapshot> {
        PersistenceSnapshot::capture(&self.session(), saved_at)
    }

    // ── Configuration ────────────────────────────────────────────────

    pub fn set_policy(&self, policy: ModeSwitchPolicy) {
        self.lock().policy = policy;
    }

    /// Registers the completion handler, replacing any previous one.
    ///
    /// Blocks while the previous handler is running, so once this returns
    /// the old handler is never called again. Must not be called from inside
    /// a handler.
    pub fn set_on_completion<F>(&self, handler: F)
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        *self.completion_slot() = Some(Arc::new(handler));
    }

    pub fn clear_on_completion(&self) {
        *self.completion_slot() = None;
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Discards any countdown and starts a fresh run of `mode`.
    pub fn start(&self, mode: Mode, duration_seconds: u32) {
        let session = {
            let mut inner = self.lock();
            let session = Session::new(mode, duration_seconds).starting(Utc::now());
            inner.begin_run(session);
            self.arm(&mut inner);
            session
        };

        tracing::debug!(mode = mode.id(), seconds = session.configured_seconds(), "run started");
        self.emit(TimerEvent::Started {
            mode,
            configured_seconds: session.configured_seconds(),
        });
    }

    /// Pauses a running countdown. Returns false (and does nothing) otherwise.
    pub fn pause(&self) -> bool {
        {
            let mut inner = self.lock();
            if !inner.session.is_running() {
                return false;
            }
            let carry = inner.uncounted();
            inner.carry = carry;
            inner.disarm();
            inner.session = inner.session.pausing(Utc::now());
        }

        tracing::debug!("run paused");
        self.emit(TimerEvent::Paused);
        true
    }

    /// Resumes a paused countdown. Returns false (and does nothing) otherwise.
    pub fn resume(&self) -> bool {
        {
            let mut inner = self.lock();
            if !inner.session.is_paused() {
                return false;
            }
            inner.session = inner.session.resuming();
            self.arm(&mut inner);
        }

        tracing::debug!("run resumed");
        self.emit(TimerEvent::Resumed);
        true
    }

    /// Stops the tick source and resets the session to idle at full duration.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            inner.disarm();
            inner.carry = Duration::ZERO;
            inner.session = inner.session.resetting();
        }

        tracing::debug!("session reset");
        self.emit(TimerEvent::Reset);
    }

    /// Switches to `mode` with a fresh full-duration session.
    ///
    /// While running under [`ModeSwitchPolicy::ContinueRunning`] the new
    /// session keeps counting down; otherwise it is left idle.
    pub fn change_mode(&self, mode: Mode, duration_seconds: u32) {
        let running = {
            let mut inner = self.lock();
            let keep_running =
                inner.session.is_running() && inner.policy == ModeSwitchPolicy::ContinueRunning;

            let fresh = Session::new(mode, duration_seconds);
            if keep_running {
                inner.begin_run(fresh.starting(Utc::now()));
                self.arm(&mut inner);
            } else {
                inner.begin_run(fresh);
            }
            keep_running
        };

        tracing::debug!(mode = mode.id(), running, "mode changed");
        self.emit(TimerEvent::ModeChanged { mode, running });
    }

    /// Replaces the session with a recovered one, re-arming the tick source if it is running.
    ///
    /// A completed session is adopted silently: its completion is considered
    /// already delivered.
    pub fn seed(&self, session: Session) {
        let mut inner = self.lock();
        inner.begin_run(session);
        if session.is_completed() {
            inner.completed_run = Some(inner.run);
        }
        if session.is_running() {
            self.arm(&mut inner);
        }
        tracing::debug!(
            mode = session.mode().id(),
            state = session.state().as_str(),
            remaining = session.remaining_seconds(),
            "session seeded"
        );
    }

    // ── Tick handling ────────────────────────────────────────────────

    fn arm(&self, inner: &mut Inner) {
        inner.disarm();
        let now = Instant::now();
        let anchor = now.checked_sub(inner.carry).unwrap_or(now);
        inner.carry = Duration::ZERO;
        inner.armed_at = Some(anchor);
        inner.counted = 0;

        let epoch = inner.epoch;
        let weak = Arc::downgrade(&self.inner);
        let event_tx = self.event_tx.clone();
        inner.ticker = Some(ticker::spawn(
            &self.runtime,
            anchor,
            TICK_PERIOD,
            move |seconds| apply_tick(&weak, &event_tx, epoch, seconds),
        ));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn completion_slot(&self) -> MutexGuard<'_, Option<CompletionHandler>> {
        self.inner
            .on_completion
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: TimerEvent) {
        emit(&self.event_tx, event);
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("TimerEngine")
            .field("session", &inner.session)
            .field("policy", &inner.policy)
            .field("run", &inner.run)
            .field("ticking", &inner.ticker.is_some())
            .finish()
    }
}

fn emit(event_tx: &mpsc::UnboundedSender<TimerEvent>, event: TimerEvent) {
    if event_tx.send(event).is_err() {
        tracing::trace!("timer event dropped, receiver closed");
    }
}

/// Applies one tick from the source armed at `epoch`.
fn apply_tick(
    shared: &Weak<Shared>,
    event_tx: &mpsc::UnboundedSender<TimerEvent>,
    epoch: u64,
    seconds: u32,
) -> ControlFlow<()> {
    let Some(shared) = shared.upgrade() else {
        return ControlFlow::Break(());
    };
    let mut guard = shared.state.lock().unwrap_or_else(PoisonError::into_inner);

    if guard.epoch != epoch || !guard.session.is_running() {
        tracing::trace!(epoch, current = guard.epoch, "stale tick dropped");
        return ControlFlow::Break(());
    }

    guard.counted += u64::from(seconds);
    guard.session = guard.session.advancing(seconds);
    let session = guard.session;
    emit(
        event_tx,
        TimerEvent::Tick {
            remaining_seconds: session.remaining_seconds(),
        },
    );

    if !session.is_completed() {
        return ControlFlow::Continue(());
    }

    // The task finishes on Break, so drop the handle instead of aborting it.
    guard.epoch += 1;
    guard.ticker = None;

    let run = guard.run;
    if guard.completed_run == Some(run) {
        return ControlFlow::Break(());
    }
    guard.completed_run = Some(run);
    drop(guard);

    tracing::debug!(mode = session.mode().id(), run, "run completed");
    emit(
        event_tx,
        TimerEvent::Completed {
            mode: session.mode(),
            run,
        },
    );
    let slot = shared
        .on_completion
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(handler) = slot.as_ref() {
        handler(&session);
    }
    ControlFlow::Break(())
}

// ============================================================================
// Tests
// ============================================================================
