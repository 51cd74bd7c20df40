//! Shared timer status and the handle given back to callers.

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use core::task::Waker;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Wait;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a timer is in its one-shot lifecycle.
///
/// `Pending` and `Firing` count as alive. Every other state is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerStatus {
    Pending = 0,
    /// Callback is running right now.
    Firing = 1,
    Fired = 2,
    Cancelled = 3,
    /// Discarded by a teardown before it could fire.
    Dropped = 4,
}

impl TimerStatus {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Pending,
            1 => Self::Firing,
            2 => Self::Fired,
            3 => Self::Cancelled,
            _ => Self::Dropped,
        }
    }

    #[must_use]
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Pending | Self::Firing)
    }
}

/// Status cell shared between a [`Timer`](crate::Timer), its handles and waiters.
pub(crate) struct TimerCell {
    status: AtomicU8,
    waker: Mutex<Option<Waker>>,
}

impl TimerCell {
    pub(crate) fn new() -> Self {
        Self {
            status: AtomicU8::new(TimerStatus::Pending as u8),
            waker: Mutex::new(None),
        }
    }

    pub(crate) fn status(&self) -> TimerStatus {
        TimerStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Claim the timer for firing. Fails if it is no longer pending.
    pub(crate) fn begin_fire(&self) -> bool {
        self.status
            .compare_exchange(
                TimerStatus::Pending as u8,
                TimerStatus::Firing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub(crate) fn finish_fire(&self) {
        self.status
            .store(TimerStatus::Fired as u8, Ordering::Release);
        self.wake();
    }

    /// Move a pending timer into `Cancelled` or `Dropped`.
    pub(crate) fn abandon(&self, to: TimerStatus) -> bool {
        debug_assert!(matches!(to, TimerStatus::Cancelled | TimerStatus::Dropped));
        let settled = self
            .status
            .compare_exchange(
                TimerStatus::Pending as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if settled {
            self.wake();
        }
        settled
    }

    pub(crate) fn register_waker(&self, waker: &Waker) {
        let mut slot = self.waker.lock();
        match slot.as_ref() {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    fn wake(&self) {
        let waker = self.waker.lock().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Caller-side reference to a scheduled timer.
///
/// Dropping the handle does not cancel the timer.
#[derive(Clone)]
pub struct TimerHandle {
    id: TimerId,
    cell: Arc<TimerCell>,
}

impl TimerHandle {
    pub(crate) fn new(id: TimerId, cell: Arc<TimerCell>) -> Self {
        Self { id, cell }
    }

    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.cell.status()
    }

    /// True until the callback has run or the timer was cancelled or dropped.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status().is_alive()
    }

    /// Prevent the callback from ever running.
    ///
    /// Returns `false` if the timer already fired, is firing, or was abandoned.
    /// The manager forgets the timer on its next sweep.
    pub fn cancel(&self) -> bool {
        self.cell.abandon(TimerStatus::Cancelled)
    }

    /// Future that resolves once this timer leaves the pending state.
    #[must_use]
    pub fn wait(&self) -> Wait {
        Wait::new(self.id, Arc::clone(&self.cell))
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}
