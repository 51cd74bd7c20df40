//! Awaitable side of a timer.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::sync::Arc;

use crate::handle::{TimerCell, TimerStatus};
use crate::{TimerId, WaitError};

/// Resolves once the underlying timer has fired, been cancelled, or been
/// dropped by a teardown.
///
/// The fire path wakes the task directly; nothing is polled per frame.
#[must_use = "futures do nothing unless polled"]
pub struct Wait {
    id: TimerId,
    cell: Arc<TimerCell>,
}

impl Wait {
    pub(crate) fn new(id: TimerId, cell: Arc<TimerCell>) -> Self {
        Self { id, cell }
    }

    #[must_use]
    pub fn id(&self) -> TimerId {
        self.id
    }

    fn outcome(&self) -> Option<Result<(), WaitError>> {
        match self.cell.status() {
            TimerStatus::Pending | TimerStatus::Firing => None,
            TimerStatus::Fired => Some(Ok(())),
            TimerStatus::Cancelled => Some(Err(WaitError::Cancelled)),
            TimerStatus::Dropped => Some(Err(WaitError::Dropped)),
        }
    }
}

impl Future for Wait {
    type Output = Result<(), WaitError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome() {
            return Poll::Ready(outcome);
        }

        self.cell.register_waker(cx.waker());

        // Settling may have happened between the first check and registration.
        match self.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => Poll::Pending,
        }
    }
}

impl fmt::Debug for Wait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("id", &self.id)
            .field("status", &self.cell.status())
            .finish()
    }
}
