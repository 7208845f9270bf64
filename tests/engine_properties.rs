//! End to end countdown behavior through the foreground host

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use focus_timer::{
    error::WakeError,
    services::{
        surface::ShellSurface,
        wake_lock::{WakeHold, WakeLock},
    },
    state::{Command, StateBridge, TimerSnapshot},
    tasks::{
        foreground_host::{HostDeps, HostExit},
        foreground_host_task,
    },
};
use tokio::{sync::{mpsc, watch}, task::JoinHandle, time::{sleep, timeout}};

#[derive(Default)]
struct Counts {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

struct CountingLock(Arc<Counts>);

struct CountingHold(Arc<Counts>);

impl WakeLock for CountingLock {
    fn acquire(&self, _timeout: Duration) -> Result<Box<dyn WakeHold>, WakeError> {
        self.0.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingHold(Arc::clone(&self.0))))
    }
}

/// Wake lock whose every acquisition fails
struct FailingLock(Arc<Counts>);

impl WakeLock for FailingLock {
    fn acquire(&self, _timeout: Duration) -> Result<Box<dyn WakeHold>, WakeError> {
        self.0.acquired.fetch_add(1, Ordering::SeqCst);
        Err(WakeError::Unavailable("inhibitor refused".to_string()))
    }
}

impl WakeHold for CountingHold {
    fn release(&mut self) {
        self.0.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    bridge: StateBridge,
    surface: Arc<ShellSurface>,
    counts: Arc<Counts>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: watch::Sender<bool>,
    host: JoinHandle<HostExit>,
}

impl Harness {
    fn spawn() -> Self {
        let counts = Arc::new(Counts::default());
        Self::spawn_with(Arc::new(CountingLock(Arc::clone(&counts))), counts)
    }

    fn spawn_with(wake_lock: Arc<dyn WakeLock>, counts: Arc<Counts>) -> Self {
        let bridge = StateBridge::new(TimerSnapshot::default());
        let surface = Arc::new(ShellSurface::new());
        let deps = HostDeps {
            bridge: bridge.clone(),
            wake_lock,
            surface: surface.clone(),
        };
        let (commands, queue) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let host = tokio::spawn(foreground_host_task(deps, queue, shutdown_rx));

        Self {
            bridge,
            surface,
            counts,
            commands,
            shutdown,
            host,
        }
    }

    fn send(&self, command: Command) {
        self.commands.send(command).unwrap();
    }

    fn wake_counts(&self) -> (usize, usize) {
        (
            self.counts.acquired.load(Ordering::SeqCst),
            self.counts.released.load(Ordering::SeqCst),
        )
    }

    async fn stop(self) -> HostExit {
        self.shutdown.send(true).unwrap();
        self.host.await.unwrap()
    }
}

fn snap(time_left_ms: u64, duration_ms: u64, is_running: bool) -> TimerSnapshot {
    TimerSnapshot::new(time_left_ms, duration_ms, is_running)
}

#[tokio::test(start_paused = true)]
async fn three_second_countdown_publishes_each_second_and_finishes_once() {
    let harness = Harness::spawn();
    let mut observer = harness.bridge.attach();
    assert_eq!(observer.next().await, Some(TimerSnapshot::default()));

    harness.send(Command::Start { duration_ms: 3000 });

    let mut seen = Vec::new();
    for _ in 0..4 {
        seen.push(observer.next().await.unwrap());
    }
    assert_eq!(
        seen,
        vec![
            snap(3000, 3000, true),
            snap(2000, 3000, true),
            snap(1000, 3000, true),
            snap(0, 3000, false),
        ]
    );

    sleep(Duration::from_secs(5)).await;
    assert_eq!(harness.bridge.current(), snap(0, 3000, false));
    assert_eq!(harness.wake_counts(), (1, 1));

    let surface = harness.surface.state().unwrap();
    assert!(surface.progress.is_none());
    assert_eq!(surface.finished.map(|alert| alert.title), Some("Time's up!".to_string()));

    assert_eq!(harness.stop().await, HostExit::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn countdown_runs_without_wake_hold_when_acquisition_fails() {
    let counts = Arc::new(Counts::default());
    let harness = Harness::spawn_with(Arc::new(FailingLock(Arc::clone(&counts))), counts);
    let mut observer = harness.bridge.attach();
    assert_eq!(observer.next().await, Some(TimerSnapshot::default()));

    harness.send(Command::Start { duration_ms: 3000 });
    assert_eq!(observer.next().await, Some(snap(3000, 3000, true)));
    assert_eq!(observer.next().await, Some(snap(2000, 3000, true)));
    assert_eq!(observer.next().await, Some(snap(1000, 3000, true)));
    assert_eq!(observer.next().await, Some(snap(0, 3000, false)));

    // Nothing follows the single finish
    assert!(timeout(Duration::from_secs(5), observer.next()).await.is_err());
    assert_eq!(harness.wake_counts(), (1, 0));

    let surface = harness.surface.state().unwrap();
    assert!(surface.progress.is_none());
    assert!(surface.finished.is_some());
    assert_eq!(harness.surface.dismiss_finished(), Ok(true));
    assert_eq!(harness.surface.dismiss_finished(), Ok(false));

    assert_eq!(harness.stop().await, HostExit::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn late_observer_sees_current_value_then_the_rest() {
    let harness = Harness::spawn();
    let mut early = harness.bridge.attach();

    harness.send(Command::Start { duration_ms: 3000 });
    while early.next().await != Some(snap(2000, 3000, true)) {}

    let mut late = harness.bridge.attach();
    assert_eq!(late.current(), snap(2000, 3000, true));
    assert_eq!(late.next().await, Some(snap(2000, 3000, true)));
    assert_eq!(late.next().await, Some(snap(1000, 3000, true)));
    assert_eq!(late.next().await, Some(snap(0, 3000, false)));

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn pause_then_resume_continues_from_remaining_time() {
    let harness = Harness::spawn();
    let mut observer = harness.bridge.attach();

    harness.send(Command::Start { duration_ms: 3000 });
    while observer.next().await != Some(snap(2000, 3000, true)) {}

    sleep(Duration::from_millis(500)).await;
    harness.send(Command::Pause);
    assert_eq!(observer.next().await, Some(snap(2000, 3000, false)));
    assert_eq!(harness.wake_counts(), (1, 1));

    // Paused time does not count down
    sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.bridge.current(), snap(2000, 3000, false));

    harness.send(Command::TogglePausePlay);
    assert_eq!(observer.next().await, Some(snap(2000, 3000, true)));
    assert_eq!(observer.next().await, Some(snap(1000, 3000, true)));
    assert_eq!(observer.next().await, Some(snap(0, 3000, false)));
    assert_eq!(harness.wake_counts(), (2, 2));

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn reset_stops_and_rearms() {
    let harness = Harness::spawn();
    let mut observer = harness.bridge.attach();

    harness.send(Command::Start { duration_ms: 60_000 });
    while observer.next().await != Some(snap(59_000, 60_000, true)) {}

    harness.send(Command::Reset { duration_ms: 5000 });
    assert_eq!(observer.next().await, Some(snap(5000, 5000, false)));
    assert_eq!(harness.wake_counts(), (1, 1));

    sleep(Duration::from_secs(3)).await;
    assert_eq!(harness.bridge.current(), snap(5000, 5000, false));
    assert!(harness.surface.state().unwrap().progress.is_none());

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn non_positive_start_does_nothing() {
    let harness = Harness::spawn();

    harness.send(Command::Start { duration_ms: 0 });
    harness.send(Command::Start { duration_ms: -1000 });
    sleep(Duration::from_secs(3)).await;

    assert_eq!(harness.bridge.current(), TimerSnapshot::default());
    assert_eq!(harness.wake_counts(), (0, 0));
    assert!(harness.surface.state().unwrap().progress.is_none());

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_run_releases_wake_hold() {
    let harness = Harness::spawn();
    let mut observer = harness.bridge.attach();

    harness.send(Command::Start { duration_ms: 60_000 });
    while observer.next().await != Some(snap(58_000, 60_000, true)) {}

    let counts = Arc::clone(&harness.counts);
    let surface = Arc::clone(&harness.surface);
    assert_eq!(harness.stop().await, HostExit::Shutdown);

    assert_eq!(counts.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(counts.released.load(Ordering::SeqCst), 1);
    assert!(surface.state().unwrap().progress.is_none());
}

#[tokio::test(start_paused = true)]
async fn every_published_snapshot_keeps_time_left_within_duration() {
    let harness = Harness::spawn();
    let mut observer = harness.bridge.attach();
    assert_eq!(observer.next().await, Some(TimerSnapshot::default()));

    harness.send(Command::Reset { duration_ms: 4000 });
    harness.send(Command::Start { duration_ms: 4000 });
    harness.send(Command::Reset { duration_ms: 2000 });
    harness.send(Command::Start { duration_ms: 9000 });

    let mut last = None;
    while let Some(snapshot) = observer.next().await {
        assert!(snapshot.time_left_ms <= snapshot.duration_ms, "{:?}", snapshot);
        last = Some(snapshot);
        if snapshot.time_left_ms == 0 {
            break;
        }
    }
    // Start resumed from the armed 2000ms rather than the requested 9000ms
    assert_eq!(last, Some(snap(0, 2000, false)));

    harness.stop().await;
}
