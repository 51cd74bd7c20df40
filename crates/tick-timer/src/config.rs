//! Manager configuration.

use std::env;

use crate::ConfigError;

/// Tunables for a [`TimerManager`](crate::TimerManager).
#[derive(Debug, Clone, PartialEq)]
pub struct TimerConfig {
    /// Capacity reserved for the live timer collection.
    pub initial_capacity: usize,
    /// Longest delay `schedule` accepts, in seconds.
    pub max_delay: f32,
    /// Catch callback panics per timer instead of unwinding out of `tick`.
    pub catch_panics: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            max_delay: f32::MAX,
            catch_panics: true,
        }
    }
}

impl TimerConfig {
    pub const CAPACITY_VAR: &'static str = "TICK_TIMER_CAPACITY";
    pub const MAX_DELAY_VAR: &'static str = "TICK_TIMER_MAX_DELAY";
    pub const CATCH_PANICS_VAR: &'static str = "TICK_TIMER_CATCH_PANICS";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    pub fn with_max_delay(mut self, max_delay: f32) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// Defaults overridden by `TICK_TIMER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(Self::CAPACITY_VAR) {
            config.initial_capacity = raw
                .trim()
                .parse()
                .map_err(|_| invalid(Self::CAPACITY_VAR, &raw))?;
        }

        if let Some(raw) = lookup(Self::MAX_DELAY_VAR) {
            let max_delay: f32 = raw
                .trim()
                .parse()
                .map_err(|_| invalid(Self::MAX_DELAY_VAR, &raw))?;
            if !(max_delay.is_finite() && max_delay >= 0.0) {
                return Err(invalid(Self::MAX_DELAY_VAR, &raw));
            }
            config.max_delay = max_delay;
        }

        if let Some(raw) = lookup(Self::CATCH_PANICS_VAR) {
            config.catch_panics = match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid(Self::CATCH_PANICS_VAR, &raw)),
            };
        }

        Ok(config)
    }

    /// Whether `delay` is acceptable for a new timer.
    #[must_use]
    pub fn accepts(&self, delay: f32) -> bool {
        delay.is_finite() && delay >= 0.0 && delay <= self.max_delay
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError {
        key,
        value: value.to_string(),
    }
}
