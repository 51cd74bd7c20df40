//! Error types for scheduling and awaiting timers.

use thiserror::Error;

use crate::TimerId;

/// Returned by [`TickSource::attach`](crate::TickSource::attach) when the host
/// refuses to locate or create the object that emits ticks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tick source `{source_name}` unavailable: {reason}")]
pub struct SourceError {
    pub source_name: String,
    pub reason: String,
}

impl SourceError {
    pub fn new(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised synchronously by [`TimerManager::schedule`](crate::TimerManager::schedule).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Delay is NaN, infinite, negative, or above the configured maximum.
    #[error("invalid delay: {delay}")]
    InvalidDelay { delay: f32 },

    /// The tick source could not be attached, so the timer would never fire.
    #[error("scheduling unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),
}

/// Why a [`Wait`](crate::Wait) resolved without its timer firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The timer was cancelled through its handle or the manager.
    #[error("timer cancelled")]
    Cancelled,

    /// The manager was torn down while the timer was still pending.
    #[error("timer dropped by teardown")]
    Dropped,
}

/// Invalid value in an environment-provided configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for {key}: {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

/// A callback that panicked during a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("callback for timer {id} panicked: {message}")]
pub struct CallbackFailure {
    pub id: TimerId,
    pub message: String,
}

/// Result type for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
