//! End-to-end behavior of a manager driven like a host frame loop.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::task::{Context, Poll, Wake, Waker};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tick_timer::{ManualTickSource, SourceState, TimerManager, TimerStatus, WaitError};

fn setup() -> (TimerManager, ManualTickSource) {
    let source = ManualTickSource::new();
    (TimerManager::new(source.clone()), source)
}

/// Deliver a tick only when the source wants one, as a host would.
fn frame(manager: &TimerManager, source: &ManualTickSource, delta: f32) {
    if source.is_enabled() {
        manager.tick(delta);
    }
}

struct CountingWaker(AtomicUsize);

impl Wake for CountingWaker {
    fn wake(self: Arc<Self>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_two_timers_fire_on_expected_ticks() {
    let (manager, source) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));
    let tick_no = Arc::new(AtomicU32::new(0));

    for (label, delay) in [("A", 1.0), ("B", 2.5)] {
        let log = Arc::clone(&log);
        let tick_no = Arc::clone(&tick_no);
        manager
            .schedule(delay, move || {
                log.lock().push((label, tick_no.load(Ordering::SeqCst)));
            })
            .unwrap();
    }

    for n in 1..=3 {
        tick_no.store(n, Ordering::SeqCst);
        frame(&manager, &source, 1.0);
    }

    // A: elapsed 1.0 after tick 1 is not > 1.0, fires at tick 2.
    // B: elapsed 3.0 after tick 3 is > 2.5.
    assert_eq!(*log.lock(), vec![("A", 2), ("B", 3)]);
    assert!(manager.is_empty());
    assert!(!source.is_enabled());
}

#[test]
fn test_awaitable_resolves_after_cumulative_delay_exceeded() {
    let (manager, source) = setup();
    let mut wait = manager.wait(0.5).unwrap();
    let counter = Arc::new(CountingWaker(AtomicUsize::new(0)));
    let waker = Waker::from(Arc::clone(&counter));
    let mut cx = Context::from_waker(&waker);

    assert!(Pin::new(&mut wait).poll(&mut cx).is_pending());

    frame(&manager, &source, 0.3);
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);
    assert!(Pin::new(&mut wait).poll(&mut cx).is_pending());

    frame(&manager, &source, 0.3);
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    assert_eq!(Pin::new(&mut wait).poll(&mut cx), Poll::Ready(Ok(())));
}

#[test]
fn test_many_timers_drain_to_inactive() {
    let (manager, source) = setup();
    let fired = Arc::new(AtomicU32::new(0));
    let handles: Vec<_> = (0..50)
        .map(|i| {
            let fired = Arc::clone(&fired);
            manager
                .schedule(i as f32 * 0.1, move || {
                    fired.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
        })
        .collect();

    let mut frames = 0;
    while source.is_enabled() {
        frame(&manager, &source, 1.0 / 60.0);
        frames += 1;
        assert!(frames < 10_000, "sweep never drained");
    }

    assert_eq!(fired.load(Ordering::SeqCst), 50);
    assert!(handles.iter().all(|h| h.status() == TimerStatus::Fired));
    assert!(manager.is_empty());
    assert_eq!(manager.source_state(), SourceState::Inactive);
}

#[test]
fn test_teardown_mid_flight_silences_everything() {
    let (manager, source) = setup();
    let fired = Arc::new(AtomicU32::new(0));
    for delay in [0.2, 0.4, 5.0, 10.0] {
        let fired = Arc::clone(&fired);
        manager
            .schedule(delay, move || {
                fired.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
    }
    let wait = manager.wait(3.0).unwrap();

    frame(&manager, &source, 0.5);
    assert_eq!(fired.load(Ordering::SeqCst), 2);

    assert_eq!(manager.teardown(), 3);
    source.detach();
    for _ in 0..20 {
        frame(&manager, &source, 1.0);
        manager.tick(1.0);
    }

    assert_eq!(fired.load(Ordering::SeqCst), 2);
    assert_eq!(pollster::block_on(wait), Err(WaitError::Dropped));
}

#[test]
fn test_cancelled_wait_fails() {
    let (manager, source) = setup();
    let handle = manager.schedule_silent(1.0).unwrap();
    let wait = handle.wait();
    assert!(handle.cancel());

    frame(&manager, &source, 2.0);
    assert_eq!(pollster::block_on(wait), Err(WaitError::Cancelled));
    assert!(!source.is_enabled());
}

#[test]
fn test_frame_loop_on_another_thread() {
    let source = ManualTickSource::new();
    let manager = Arc::new(TimerManager::new(source.clone()));
    let stop = Arc::new(AtomicBool::new(false));

    let host = {
        let manager = Arc::clone(&manager);
        let source = source.clone();
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Acquire) {
                frame(&manager, &source, 0.01);
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    let waits: Vec<_> = (1..=5)
        .map(|i| manager.wait(i as f32 * 0.02).unwrap())
        .collect();
    for wait in waits {
        assert_eq!(pollster::block_on(wait), Ok(()));
    }

    stop.store(true, Ordering::Release);
    host.join().unwrap();
    assert!(manager.is_empty());
}
