//! Frame-loop host for the tick-timer manager
//!
//! This binary:
//! 1. Creates a host with a hook registry and installs a process-wide
//!    `TimerManager` whose tick source is a frame hook on that host
//! 2. Runs a fixed-rate frame loop on its own thread, ticking the manager
//!    while its hook is enabled
//! 3. Schedules a demo workload, awaits some of it, then tears the host down
//!
//! Environment:
//! - `TARGET_FPS` - frame rate of the loop (default 20)
//! - `DEMO_DURATION_SECS` - how long to keep running after the workload
//! - `TICK_TIMER_*` - manager settings, see `TimerConfig::from_env`

mod config;
mod host;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tick_timer::TimerManager;
use tracing::{info, warn};

use crate::config::RunnerConfig;
use crate::host::{Host, HookSource};

const HOOK_NAME: &str = "timer-hook";

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tick_timer_runner=info".parse()?)
                .add_directive("tick_timer=info".parse()?),
        )
        .init();

    let config = RunnerConfig::from_env()?;
    info!(
        target_fps = config.target_fps,
        linger = ?config.linger,
        "starting frame loop host"
    );

    let host = Arc::new(Host::new(1));
    let source = HookSource::new(Arc::clone(&host), HOOK_NAME);
    let Ok(manager) =
        TimerManager::install_global(TimerManager::with_config(source, config.timers.clone()))
    else {
        eyre::bail!("timer manager already installed");
    };

    let running = Arc::new(AtomicBool::new(true));
    let frame_loop = {
        let host = Arc::clone(&host);
        let running = Arc::clone(&running);
        let frame = config.frame_duration();
        thread::spawn(move || run_frames(&host, manager, frame, &running))
    };

    run_workload(manager)?;

    thread::sleep(config.linger);
    running.store(false, Ordering::Release);
    if frame_loop.join().is_err() {
        warn!("frame loop panicked");
    }

    Ok(())
}

/// Tick the manager once per frame until `running` clears, then destroy the
/// host's hooks and report the teardown to the manager.
fn run_frames(host: &Host, manager: &TimerManager, frame: Duration, running: &AtomicBool) {
    let mut last = Instant::now();
    let mut frames: u64 = 0;

    while running.load(Ordering::Acquire) {
        let start = Instant::now();
        let delta = start.duration_since(last).as_secs_f32();
        last = start;

        host.update(delta, |_hook, delta| {
            manager.tick(delta);
        });
        frames += 1;

        let elapsed = start.elapsed();
        if elapsed < frame {
            thread::sleep(frame - elapsed);
        }
    }

    let destroyed = host.destroy_all();
    if !destroyed.is_empty() {
        let dropped = manager.teardown();
        info!(frames, dropped, "frame loop stopped");
    }
}

fn run_workload(manager: &TimerManager) -> eyre::Result<()> {
    let fired = Arc::new(AtomicU32::new(0));

    for delay in [0.25_f32, 0.5, 1.0] {
        let fired = Arc::clone(&fired);
        let started = Instant::now();
        manager.schedule(delay, move || {
            fired.fetch_add(1, Ordering::SeqCst);
            info!(delay, actual = ?started.elapsed(), "timer fired");
        })?;
    }

    // A callback may schedule follow-ups on the same manager.
    manager.schedule(0.75, || {
        let chained = TimerManager::global().schedule(0.25, || info!("chained timer fired"));
        if let Err(err) = chained {
            warn!(%err, "failed to chain timer");
        }
    })?;

    let started = Instant::now();
    pollster::block_on(manager.wait(1.5)?)?;
    info!(
        waited = ?started.elapsed(),
        fired = fired.load(Ordering::SeqCst),
        "awaited timer resolved"
    );

    // Still pending when the host shuts down; dropped by teardown.
    manager.schedule(3600.0, || warn!("should never fire"))?;

    Ok(())
}
