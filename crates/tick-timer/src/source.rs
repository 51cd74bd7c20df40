//! Host collaborators that emit ticks.
//!
//! The manager never creates host objects itself. The composition root hands
//! it a [`TickSource`]; the manager asks that source to attach (find or create
//! the host object) the first time a timer is scheduled, and toggles it on and
//! off as the timer collection fills and drains. The host delivers the actual
//! ticks by calling [`TimerManager::tick`](crate::TimerManager::tick) and
//! reports destruction through [`TimerManager::teardown`](crate::TimerManager::teardown).

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::SourceError;

/// Contract a host tick emitter must satisfy.
pub trait TickSource: Send {
    /// Find the existing host object or create exactly one. Must be idempotent.
    fn attach(&mut self) -> Result<(), SourceError>;

    /// Start or stop emitting ticks. A disabled source stays destructible.
    fn set_enabled(&mut self, enabled: bool);

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        "tick-source"
    }
}

impl<T: TickSource + ?Sized> TickSource for Box<T> {
    fn attach(&mut self) -> Result<(), SourceError> {
        (**self).attach()
    }

    fn set_enabled(&mut self, enabled: bool) {
        (**self).set_enabled(enabled);
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Source for hosts that pump ticks unconditionally and have no object to
/// locate. Backs the lazily created process-wide manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessTickSource;

impl TickSource for HeadlessTickSource {
    fn attach(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    fn set_enabled(&mut self, _enabled: bool) {}

    fn name(&self) -> &str {
        "headless"
    }
}

#[derive(Debug, Default)]
struct ManualState {
    enabled: AtomicBool,
    attached: AtomicBool,
    attach_calls: AtomicU32,
    refuse_attach: AtomicBool,
}

/// Shared-flag source for hosts that poll whether ticks are wanted.
///
/// Clones observe the same state, so the host keeps one clone to check
/// [`is_enabled`](Self::is_enabled) each frame while the manager owns another.
#[derive(Debug, Default, Clone)]
pub struct ManualTickSource {
    state: Arc<ManualState>,
}

impl ManualTickSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the manager currently wants ticks.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.state.attached.load(Ordering::Acquire)
    }

    /// Number of successful attach calls that created the host object.
    #[must_use]
    pub fn attach_count(&self) -> u32 {
        self.state.attach_calls.load(Ordering::Acquire)
    }

    /// Make subsequent attach calls fail, simulating a host that refuses to
    /// create the emitter.
    pub fn refuse_attach(&self, refuse: bool) {
        self.state.refuse_attach.store(refuse, Ordering::Release);
    }

    /// Forget the host object, as after the host destroyed it.
    pub fn detach(&self) {
        self.state.attached.store(false, Ordering::Release);
        self.state.enabled.store(false, Ordering::Release);
    }
}

impl TickSource for ManualTickSource {
    fn attach(&mut self) -> Result<(), SourceError> {
        if self.state.refuse_attach.load(Ordering::Acquire) {
            return Err(SourceError::new(self.name(), "host refused to create tick emitter"));
        }
        if !self.state.attached.swap(true, Ordering::AcqRel) {
            self.state.attach_calls.fetch_add(1, Ordering::AcqRel);
        }
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled.store(enabled, Ordering::Release);
    }

    fn name(&self) -> &str {
        "manual"
    }
}
