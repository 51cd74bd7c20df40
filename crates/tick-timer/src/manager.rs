//! Owner of all live timers and the per-tick sweep.

use core::fmt;
use core::mem;
use std::panic;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, error, info, trace, warn};

use crate::handle::{TimerCell, TimerStatus};
use crate::timer::{Callback, Fire, PanicPayload, Timer, panic_message};
use crate::{
    CallbackFailure, HeadlessTickSource, ScheduleError, ScheduleResult, SourceError, TickSource,
    TimerConfig, TimerHandle, TimerId, Wait,
};

static GLOBAL: OnceLock<TimerManager> = OnceLock::new();

/// Lifecycle of the tick source as seen by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceState {
    /// Never attached, or torn down by the host. The next schedule attaches.
    Detached,
    /// Attached but disabled; no live timers.
    Inactive,
    /// Attached and enabled; at least one live timer.
    Active,
}

/// What happened during one [`TimerManager::tick`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Pending timers that received the tick's delta.
    pub advanced: usize,
    /// Timers whose callbacks ran to completion, in firing order.
    pub fired: SmallVec<[TimerId; 4]>,
    /// Cancelled timers removed from the collection.
    pub cancelled: usize,
    /// Callbacks that panicked.
    pub failures: Vec<CallbackFailure>,
}

impl SweepReport {
    /// True when the sweep neither fired nor removed anything.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.fired.is_empty() && self.cancelled == 0 && self.failures.is_empty()
    }
}

struct Inner {
    timers: Vec<Timer>,
    /// Due timers taken out of `timers` whose callbacks have not run yet.
    /// Kept so `cancel` and `teardown` can still settle them.
    in_flight: Vec<(TimerId, Arc<TimerCell>)>,
    source: Box<dyn TickSource>,
    state: SourceState,
}

impl Inner {
    /// Bring the source to `Active`, attaching it first if needed.
    fn activate(&mut self) -> Result<(), SourceError> {
        if self.state == SourceState::Detached {
            self.source.attach()?;
            debug!(source = self.source.name(), "attached tick source");
            self.state = SourceState::Inactive;
        }
        if self.state == SourceState::Inactive {
            self.source.set_enabled(true);
            self.state = SourceState::Active;
        }
        Ok(())
    }

    fn deactivate(&mut self) {
        if self.state == SourceState::Active {
            self.source.set_enabled(false);
            self.state = SourceState::Inactive;
            trace!(source = self.source.name(), "no live timers, tick source disabled");
        }
    }

    /// Advance every pending timer once and split off the ones now due.
    /// Survivors keep their insertion order.
    fn collect_due(&mut self, delta: f32, report: &mut SweepReport) -> Vec<Timer> {
        let mut survivors = Vec::with_capacity(self.timers.len());
        let mut due = Vec::new();

        for mut timer in self.timers.drain(..) {
            if timer.status() != TimerStatus::Pending {
                report.cancelled += 1;
                continue;
            }
            report.advanced += 1;
            if timer.accumulate(delta) {
                due.push(timer);
            } else {
                survivors.push(timer);
            }
        }

        self.timers = survivors;
        self.in_flight
            .extend(due.iter().map(|timer| (timer.id(), Arc::clone(timer.cell()))));
        due
    }
}

/// Schedules one-shot callbacks and drives them from an external tick.
///
/// Every method takes `&self`; the collection lives behind one mutex. Callbacks
/// run with the lock released, so they may schedule or cancel timers on the
/// same manager.
///
/// # Example
///
/// ```
/// use tick_timer::{ManualTickSource, TimerManager};
///
/// let source = ManualTickSource::new();
/// let manager = TimerManager::new(source.clone());
///
/// let handle = manager.schedule(1.0, || {}).unwrap();
/// assert!(source.is_enabled());
///
/// manager.tick(0.6);
/// manager.tick(0.6);
/// assert!(!handle.is_alive());
/// assert!(!source.is_enabled());
/// ```
pub struct TimerManager {
    inner: Mutex<Inner>,
    config: TimerConfig,
}

impl TimerManager {
    /// Create a manager driven by `source` with default configuration.
    pub fn new<S: TickSource + 'static>(source: S) -> Self {
        Self::with_config(source, TimerConfig::default())
    }

    pub fn with_config<S: TickSource + 'static>(source: S, config: TimerConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                timers: Vec::with_capacity(config.initial_capacity),
                in_flight: Vec::new(),
                source: Box::new(source),
                state: SourceState::Detached,
            }),
            config,
        }
    }

    /// The process-wide manager, created on first use with a
    /// [`HeadlessTickSource`] unless one was installed earlier.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            debug!("creating process-wide timer manager");
            Self::new(HeadlessTickSource)
        })
    }

    /// Install `manager` as the process-wide instance. Fails, handing the
    /// manager back, if [`global`](Self::global) was already initialized.
    pub fn install_global(manager: Self) -> Result<&'static Self, Self> {
        match GLOBAL.set(manager) {
            Ok(()) => Ok(Self::global()),
            Err(manager) => Err(manager),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Run `callback` once more than `delay` seconds of tick time have passed.
    pub fn schedule<F>(&self, delay: f32, callback: F) -> ScheduleResult<TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.insert(delay, Some(Box::new(callback)))
    }

    /// Schedule a timer without a callback, useful only through its handle.
    pub fn schedule_silent(&self, delay: f32) -> ScheduleResult<TimerHandle> {
        self.insert(delay, None)
    }

    /// Schedule a timer and return a future that resolves after it fires.
    ///
    /// Scheduling errors surface here, before anything is awaited.
    pub fn wait(&self, delay: f32) -> ScheduleResult<Wait> {
        Ok(self.schedule_silent(delay)?.wait())
    }

    fn insert(&self, delay: f32, callback: Option<Callback>) -> ScheduleResult<TimerHandle> {
        if !self.config.accepts(delay) {
            warn!(delay, max_delay = self.config.max_delay, "rejected timer delay");
            return Err(ScheduleError::InvalidDelay { delay });
        }

        let mut inner = self.inner.lock();
        if let Err(err) = inner.activate() {
            warn!(%err, "cannot schedule timer");
            return Err(err.into());
        }

        let timer = Timer::with_callback(delay, callback);
        let handle = timer.handle();
        trace!(id = %handle.id(), delay, live = inner.timers.len() + 1, "scheduled timer");
        inner.timers.push(timer);
        Ok(handle)
    }

    /// Sweep all live timers with one frame's elapsed time.
    ///
    /// Ignored while the source is not active. Due timers fire in insertion
    /// order after the lock is released. When the collection ends up empty the
    /// source is disabled.
    ///
    /// # Panics
    ///
    /// With `catch_panics` disabled, re-raises the first callback panic once
    /// every other due timer has fired.
    pub fn tick(&self, delta: f32) -> SweepReport {
        let mut report = SweepReport::default();

        let due = {
            let mut inner = self.inner.lock();
            if inner.state != SourceState::Active {
                return report;
            }
            inner.collect_due(delta, &mut report)
        };

        let unwinding = self.fire_due(due, &mut report);

        {
            let mut inner = self.inner.lock();
            inner
                .in_flight
                .retain(|(_, cell)| cell.status() == TimerStatus::Pending);
            if inner.timers.is_empty() {
                inner.deactivate();
            }
        }

        if !report.is_quiet() {
            debug!(
                delta,
                advanced = report.advanced,
                fired = report.fired.len(),
                cancelled = report.cancelled,
                failed = report.failures.len(),
                "timer sweep"
            );
        }

        if let Some(payload) = unwinding {
            panic::resume_unwind(payload);
        }
        report
    }

    fn fire_due(&self, due: Vec<Timer>, report: &mut SweepReport) -> Option<PanicPayload> {
        let mut unwinding = None;

        for mut timer in due {
            let id = timer.id();
            match timer.fire() {
                // Cancelled or torn down by another thread or an earlier
                // callback in this sweep.
                Fire::Skipped => {
                    if timer.status() == TimerStatus::Cancelled {
                        report.cancelled += 1;
                    }
                }
                Fire::Ran => report.fired.push(id),
                Fire::Panicked(payload) => {
                    let failure = CallbackFailure {
                        id,
                        message: panic_message(payload.as_ref()),
                    };
                    error!(id = %failure.id, message = %failure.message, "timer callback panicked");
                    report.failures.push(failure);
                    if !self.config.catch_panics && unwinding.is_none() {
                        unwinding = Some(payload);
                    }
                }
            }
        }

        unwinding
    }

    /// The host destroyed the tick source: forget it and drop every pending
    /// timer without running its callback. Returns how many were dropped.
    ///
    /// Timers already due in a sweep running concurrently are dropped too,
    /// unless their callback has started.
    pub fn teardown(&self) -> usize {
        let (discarded, in_flight) = {
            let mut inner = self.inner.lock();
            inner.state = SourceState::Detached;
            (mem::take(&mut inner.timers), mem::take(&mut inner.in_flight))
        };

        let mut dropped = 0;
        for mut timer in discarded {
            if timer.abandon(TimerStatus::Dropped) {
                dropped += 1;
            }
        }
        for (_, cell) in in_flight {
            if cell.abandon(TimerStatus::Dropped) {
                dropped += 1;
            }
        }
        info!(dropped, "tick source torn down");
        dropped
    }

    /// Remove a pending timer so its callback never runs.
    ///
    /// Also reaches timers that are due in the sweep currently firing, as long
    /// as their callback has not started.
    pub fn cancel(&self, id: TimerId) -> bool {
        let (removed, in_flight) = {
            let mut inner = self.inner.lock();
            let removed = inner
                .timers
                .iter()
                .position(|timer| timer.id() == id)
                .map(|index| inner.timers.remove(index));
            let in_flight = inner
                .in_flight
                .iter()
                .find(|(due_id, _)| *due_id == id)
                .map(|(_, cell)| Arc::clone(cell));
            (removed, in_flight)
        };

        match (removed, in_flight) {
            (Some(mut timer), _) => timer.abandon(TimerStatus::Cancelled),
            (None, Some(cell)) => cell.abandon(TimerStatus::Cancelled),
            (None, None) => false,
        }
    }

    /// Number of timers in the collection, including cancelled ones not yet
    /// swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().timers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().timers.is_empty()
    }

    #[must_use]
    pub fn source_state(&self) -> SourceState {
        self.inner.lock().state
    }

    /// Whether the manager currently consumes ticks.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.source_state() == SourceState::Active
    }
}

impl fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("TimerManager")
            .field("timers", &inner.timers.len())
            .field("source", &inner.source.name())
            .field("state", &inner.state)
            .field("config", &self.config)
            .finish()
    }
}
