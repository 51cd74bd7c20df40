//! Runner settings read from the environment.

use std::env;
use std::time::Duration;

use tick_timer::{ConfigError, TimerConfig};

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub target_fps: f32,
    /// How long the demo keeps the frame loop alive after its workload.
    pub linger: Duration,
    pub timers: TimerConfig,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let target_fps: f32 = parse_var("TARGET_FPS")?.unwrap_or(20.0);
        if !(target_fps.is_finite() && target_fps > 0.0) {
            return Err(ConfigError {
                key: "TARGET_FPS",
                value: target_fps.to_string(),
            });
        }

        let linger_secs: f32 = parse_var("DEMO_DURATION_SECS")?.unwrap_or(1.0);
        let linger = Duration::try_from_secs_f32(linger_secs).map_err(|_| ConfigError {
            key: "DEMO_DURATION_SECS",
            value: linger_secs.to_string(),
        })?;

        Ok(Self {
            target_fps,
            linger,
            timers: TimerConfig::from_env()?,
        })
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.target_fps)
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError { key, value: raw }),
        Err(_) => Ok(None),
    }
}
