//! Minimal host runtime: frame hooks that forward per-frame updates.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tick_timer::{SourceError, TickSource};
use tracing::{debug, info};

/// Host object that receives an update every frame while enabled.
#[derive(Debug)]
pub struct FrameHook {
    name: String,
    enabled: AtomicBool,
}

impl FrameHook {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }
}

/// Registry of live frame hooks.
#[derive(Debug)]
pub struct Host {
    hooks: Mutex<Vec<Arc<FrameHook>>>,
    max_hooks: usize,
}

impl Host {
    pub fn new(max_hooks: usize) -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            max_hooks,
        }
    }

    /// Find the hook called `name`, creating it if absent.
    pub fn find_or_spawn(&self, name: &str) -> Option<Arc<FrameHook>> {
        let mut hooks = self.hooks.lock();
        if let Some(hook) = hooks.iter().find(|hook| hook.name == name) {
            return Some(Arc::clone(hook));
        }
        if hooks.len() >= self.max_hooks {
            return None;
        }
        let hook = Arc::new(FrameHook {
            name: name.to_string(),
            enabled: AtomicBool::new(false),
        });
        hooks.push(Arc::clone(&hook));
        debug!(hook = name, "spawned frame hook");
        Some(hook)
    }

    /// Run `update` once for every enabled hook.
    pub fn update<F>(&self, delta: f32, mut update: F)
    where
        F: FnMut(&FrameHook, f32),
    {
        let hooks: Vec<_> = self.hooks.lock().iter().cloned().collect();
        for hook in hooks.iter().filter(|hook| hook.is_enabled()) {
            update(hook, delta);
        }
    }

    /// Destroy every hook, returning their names.
    pub fn destroy_all(&self) -> Vec<String> {
        let destroyed: Vec<_> = self
            .hooks
            .lock()
            .drain(..)
            .map(|hook| hook.name.clone())
            .collect();
        info!(count = destroyed.len(), "destroyed frame hooks");
        destroyed
    }
}

/// [`TickSource`] backed by a named [`FrameHook`] on a [`Host`].
#[derive(Debug)]
pub struct HookSource {
    host: Arc<Host>,
    name: String,
    hook: Option<Arc<FrameHook>>,
}

impl HookSource {
    pub fn new(host: Arc<Host>, name: impl Into<String>) -> Self {
        Self {
            host,
            name: name.into(),
            hook: None,
        }
    }
}

impl TickSource for HookSource {
    fn attach(&mut self) -> Result<(), SourceError> {
        let hook = self
            .host
            .find_or_spawn(&self.name)
            .ok_or_else(|| SourceError::new(&self.name, "host hook limit reached"))?;
        self.hook = Some(hook);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        if let Some(hook) = &self.hook {
            hook.set_enabled(enabled);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_or_spawn_reuses_hook() {
        let host = Host::new(4);
        let a = host.find_or_spawn("timers").unwrap();
        let b = host.find_or_spawn("timers").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_hook_limit() {
        let host = Arc::new(Host::new(0));
        let mut source = HookSource::new(Arc::clone(&host), "timers");
        let err = source.attach().unwrap_err();
        assert_eq!(err.source_name, "timers");
    }

    #[test]
    fn test_only_enabled_hooks_update() {
        let host = Arc::new(Host::new(4));
        let mut source = HookSource::new(Arc::clone(&host), "timers");
        source.attach().unwrap();
        host.find_or_spawn("other").unwrap();

        let mut seen = Vec::new();
        host.update(0.1, |hook, _| seen.push(hook.name().to_string()));
        assert!(seen.is_empty());

        source.set_enabled(true);
        host.update(0.1, |hook, _| seen.push(hook.name().to_string()));
        assert_eq!(seen, vec!["timers"]);

        assert_eq!(host.destroy_all().len(), 2);
    }
}
