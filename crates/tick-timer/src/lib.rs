#![allow(clippy::redundant_pub_crate)]

//! Tick Timer
//!
//! One-shot delayed callbacks driven by a per-frame tick.
//!
//! # Model
//!
//! ```text
//! schedule(delay, cb) ──► TimerManager ──► attach + enable TickSource
//!                              │
//! host frame loop ── tick(dt) ─┤  advance every live timer by dt
//!                              │  fire timers whose elapsed > delay
//!                              │  disable TickSource when none remain
//!                              │
//! host teardown ─ teardown() ──┘  drop all pending timers, detach
//! ```
//!
//! - **Timer**: one pending action plus elapsed-time bookkeeping
//! - **TimerManager**: owns live timers and runs the sweep
//! - **TickSource**: host collaborator the manager switches on and off
//! - **Wait**: future resolved directly by a timer's fire path
//!
//! # Example
//!
//! ```
//! use tick_timer::{ManualTickSource, TimerManager};
//!
//! let source = ManualTickSource::new();
//! let manager = TimerManager::new(source.clone());
//!
//! let wait = manager.wait(0.5).unwrap();
//! while source.is_enabled() {
//!     manager.tick(0.3);
//! }
//! assert!(pollster::block_on(wait).is_ok());
//! ```

mod config;
mod error;
mod handle;
mod manager;
mod source;
mod timer;
mod wait;

pub use config::TimerConfig;
pub use error::{
    CallbackFailure, ConfigError, ScheduleError, ScheduleResult, SourceError, WaitError,
};
pub use handle::{TimerHandle, TimerId, TimerStatus};
pub use manager::{SourceState, SweepReport, TimerManager};
pub use source::{HeadlessTickSource, ManualTickSource, TickSource};
pub use timer::{Advance, Callback, Timer};
pub use wait::Wait;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ScheduleError, TickSource, TimerConfig, TimerHandle, TimerManager, Wait, WaitError,
    };
}
