//! A single one-shot delayed action.
//!
//! A `Timer` accumulates frame time handed to it by its owner and fires its
//! callback the first time the accumulated time strictly exceeds the delay.
//! A delay that is reached exactly does not fire yet, so a zero-delay timer
//! fires on the first advance with a positive delta.
//!
//! Elapsed time is summed in `f64` so that small frame deltas keep counting
//! after many hours of accumulated time.

use core::any::Any;
use core::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::handle::{TimerCell, TimerStatus};
use crate::{TimerHandle, TimerId};

/// Boxed callback run when a timer fires.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

pub(crate) type PanicPayload = Box<dyn Any + Send + 'static>;

/// Result of [`Timer::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Timer was already fired or abandoned; nothing happened.
    Inert,
    /// Still waiting.
    Pending,
    /// Callback ran to completion.
    Fired,
    /// Callback panicked. The timer is consumed anyway.
    Panicked(String),
}

pub(crate) enum Fire {
    Skipped,
    Ran,
    Panicked(PanicPayload),
}

pub struct Timer {
    id: TimerId,
    delay: f32,
    elapsed: f64,
    cell: Arc<TimerCell>,
    callback: Option<Callback>,
}

impl Timer {
    /// Create a pending timer. The delay is not validated here.
    pub fn new<F>(delay: f32, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::with_callback(delay, Some(Box::new(callback)))
    }

    /// Create a pending timer with no callback.
    pub fn silent(delay: f32) -> Self {
        Self::with_callback(delay, None)
    }

    pub(crate) fn with_callback(delay: f32, callback: Option<Callback>) -> Self {
        Self {
            id: TimerId::next(),
            delay,
            elapsed: 0.0,
            cell: Arc::new(TimerCell::new()),
            callback,
        }
    }

    /// Add `delta` and fire if the delay is now strictly exceeded.
    ///
    /// Panics raised by the callback are caught and returned as
    /// [`Advance::Panicked`].
    pub fn advance(&mut self, delta: f32) -> Advance {
        if !self.accumulate(delta) {
            return if self.is_alive() {
                Advance::Pending
            } else {
                Advance::Inert
            };
        }
        match self.fire() {
            Fire::Skipped => Advance::Inert,
            Fire::Ran => Advance::Fired,
            Fire::Panicked(payload) => Advance::Panicked(panic_message(payload.as_ref())),
        }
    }

    /// Add `delta` to the elapsed time of a pending timer and report whether it
    /// is now due. Does not run the callback.
    pub(crate) fn accumulate(&mut self, delta: f32) -> bool {
        if self.cell.status() != TimerStatus::Pending {
            return false;
        }
        self.elapsed += f64::from(delta);
        self.elapsed > f64::from(self.delay)
    }

    /// Run the callback and settle the timer as fired.
    pub(crate) fn fire(&mut self) -> Fire {
        if !self.cell.begin_fire() {
            return Fire::Skipped;
        }
        let outcome = match self.callback.take() {
            Some(callback) => panic::catch_unwind(AssertUnwindSafe(callback)),
            None => Ok(()),
        };
        self.cell.finish_fire();
        match outcome {
            Ok(()) => Fire::Ran,
            Err(payload) => Fire::Panicked(payload),
        }
    }

    pub(crate) fn cell(&self) -> &Arc<TimerCell> {
        &self.cell
    }

    /// Settle a pending timer without running its callback.
    pub(crate) fn abandon(&mut self, status: TimerStatus) -> bool {
        let settled = self.cell.abandon(status);
        if settled {
            self.callback = None;
        }
        settled
    }

    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    #[must_use]
    pub fn delay(&self) -> f32 {
        self.delay
    }

    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.cell.status()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.status().is_alive()
    }

    /// Time left until the delay is reached, never negative.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        (f64::from(self.delay) - self.elapsed).max(0.0) as f32
    }

    /// Fraction of the delay that has elapsed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.delay > 0.0 {
            (self.elapsed / f64::from(self.delay)).clamp(0.0, 1.0) as f32
        } else {
            1.0
        }
    }

    /// A handle observing this timer.
    #[must_use]
    pub fn handle(&self) -> TimerHandle {
        TimerHandle::new(self.id, Arc::clone(&self.cell))
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.id)
            .field("delay", &self.delay)
            .field("elapsed", &self.elapsed)
            .field("status", &self.status())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
