//! Countdown state machine
//!
//! Pure transition logic: no tasks, no channels. The engine feeds it commands
//! and the current instant, and carries out whatever the returned
//! [`Transition`] asks for.
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> Idle
//! ```

use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use super::{Command, TimerSnapshot};

/// Length of one tick
pub const TICK: Duration = Duration::from_secs(1);
const TICK_MS: u64 = 1000;

/// Bounds for nudging the armed duration while stopped
pub const MIN_ADJUSTED_MS: i64 = 60_000;
pub const MAX_ADJUSTED_MS: i64 = 90 * 60_000;

/// Lifecycle phase of the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
}

/// Outcome of applying a command or tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started(TimerSnapshot),
    Ticked(TimerSnapshot),
    Paused(TimerSnapshot),
    Reset(TimerSnapshot),
    /// Countdown reached zero
    Finished(TimerSnapshot),
    /// Nothing changed and nothing must be published
    Ignored,
}

impl Transition {
    /// Snapshot to publish, if any
    pub fn snapshot(&self) -> Option<TimerSnapshot> {
        match *self {
            Transition::Started(s)
            | Transition::Ticked(s)
            | Transition::Paused(s)
            | Transition::Reset(s)
            | Transition::Finished(s) => Some(s),
            Transition::Ignored => None,
        }
    }

    /// Whether this transition ends a running countdown
    pub fn stops_ticking(&self) -> bool {
        matches!(
            self,
            Transition::Paused(_) | Transition::Reset(_) | Transition::Finished(_)
        )
    }
}

/// Absolute reference for the current run
#[derive(Debug, Clone, Copy)]
struct Run {
    anchor: Instant,
    from_ms: u64,
}

/// Authoritative countdown state
#[derive(Debug)]
pub struct TimerMachine {
    phase: Phase,
    snapshot: TimerSnapshot,
    run: Option<Run>,
}

impl TimerMachine {
    /// Create an idle machine holding `seed` (forced to not running)
    pub fn new(seed: TimerSnapshot) -> Self {
        Self {
            phase: Phase::Idle,
            snapshot: seed.stopped(),
            run: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot
    }

    /// Instant the current run counts from
    pub fn anchor(&self) -> Option<Instant> {
        self.run.map(|run| run.anchor)
    }

    /// Apply an external command
    pub fn apply(&mut self, command: Command, now: Instant) -> Transition {
        match command {
            Command::Start { duration_ms } => self.start(duration_ms, now),
            Command::Pause => self.pause(),
            Command::Reset { duration_ms } => self.reset(duration_ms),
            Command::TogglePausePlay => self.toggle(now),
            Command::Adjust { delta_ms, fallback_ms } => self.adjust(delta_ms, fallback_ms),
            Command::Rearm { duration_ms } => self.rearm(duration_ms),
        }
    }

    pub fn start(&mut self, duration_ms: i64, now: Instant) -> Transition {
        if self.phase == Phase::Running {
            debug!("Start ignored, countdown already running");
            return Transition::Ignored;
        }
        if duration_ms <= 0 {
            debug!("Start ignored, non-positive duration {}ms", duration_ms);
            return Transition::Ignored;
        }

        // Resuming keeps the duration the cycle was armed with
        let (from_ms, total_ms) = if self.snapshot.time_left_ms > 0 {
            (self.snapshot.time_left_ms, self.snapshot.duration_ms)
        } else {
            (duration_ms as u64, duration_ms as u64)
        };

        self.phase = Phase::Running;
        self.run = Some(Run {
            anchor: now,
            from_ms,
        });
        self.snapshot = TimerSnapshot::new(from_ms, total_ms, true);
        Transition::Started(self.snapshot)
    }

    pub fn pause(&mut self) -> Transition {
        if self.phase != Phase::Running {
            debug!("Pause ignored, countdown not running");
            return Transition::Ignored;
        }
        self.phase = Phase::Paused;
        self.run = None;
        self.snapshot = self.snapshot.stopped();
        Transition::Paused(self.snapshot)
    }

    pub fn reset(&mut self, duration_ms: i64) -> Transition {
        let duration_ms = duration_ms.max(0) as u64;
        self.phase = Phase::Idle;
        self.run = None;
        self.snapshot = TimerSnapshot::armed(duration_ms);
        Transition::Reset(self.snapshot)
    }

    /// Re-arm with the armed duration shifted by `delta_ms`, clamped to
    /// [`MIN_ADJUSTED_MS`]..=[`MAX_ADJUSTED_MS`]
    pub fn adjust(&mut self, delta_ms: i64, fallback_ms: i64) -> Transition {
        if self.phase == Phase::Running {
            debug!("Adjust ignored, countdown running");
            return Transition::Ignored;
        }
        let base = match self.snapshot.duration_ms {
            0 => fallback_ms,
            armed => i64::try_from(armed).unwrap_or(i64::MAX),
        };
        self.reset(base.saturating_add(delta_ms).clamp(MIN_ADJUSTED_MS, MAX_ADJUSTED_MS))
    }

    pub fn rearm(&mut self, duration_ms: i64) -> Transition {
        if self.phase == Phase::Running {
            debug!("Rearm ignored, countdown running");
            return Transition::Ignored;
        }
        self.reset(duration_ms)
    }

    pub fn toggle(&mut self, now: Instant) -> Transition {
        if self.phase == Phase::Running {
            self.pause()
        } else {
            self.start(self.snapshot.time_left_ms as i64, now)
        }
    }

    /// Advance to `now`, recomputing remaining time from the run anchor
    pub fn tick(&mut self, now: Instant) -> Transition {
        let Some(run) = self.run.filter(|_| self.phase == Phase::Running) else {
            return Transition::Ignored;
        };

        let elapsed_ticks = (now.saturating_duration_since(run.anchor).as_millis() / TICK.as_millis()) as u64;
        let time_left_ms = run.from_ms.saturating_sub(elapsed_ticks.saturating_mul(TICK_MS));

        if time_left_ms == self.snapshot.time_left_ms {
            return Transition::Ignored;
        }

        if time_left_ms == 0 {
            self.phase = Phase::Idle;
            self.run = None;
            self.snapshot = TimerSnapshot::new(0, self.snapshot.duration_ms, false);
            return Transition::Finished(self.snapshot);
        }

        self.snapshot = TimerSnapshot::new(time_left_ms, self.snapshot.duration_ms, true);
        Transition::Ticked(self.snapshot)
    }
}
