//! Timer engine: state machine plus the resources a running countdown holds

use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, info};

use super::{
    machine::{Phase, TimerMachine, Transition},
    Command, StateBridge, TimerSnapshot,
};
use crate::{
    services::wake_lock::{WakeGuard, WakeLock, WAKE_MARGIN},
    tasks::ticker::{Tick, Ticker},
};

/// Owns the countdown and everything tied to it
///
/// Every command and tick goes through `&mut self`, so the snapshot has a
/// single writer. Leaving `Running` by any route, including drop, cancels
/// the ticker and releases the wake hold.
pub struct TimerEngine {
    machine: TimerMachine,
    ticker: Ticker,
    ticks_tx: mpsc::UnboundedSender<Tick>,
    wake_lock: Arc<dyn WakeLock>,
    guard: WakeGuard,
    bridge: StateBridge,
}

impl TimerEngine {
    /// Create an idle engine seeded from the bridge's current snapshot
    pub fn new(
        bridge: StateBridge,
        wake_lock: Arc<dyn WakeLock>,
        ticks_tx: mpsc::UnboundedSender<Tick>,
    ) -> Self {
        Self {
            machine: TimerMachine::new(bridge.current()),
            ticker: Ticker::new(),
            ticks_tx,
            wake_lock,
            guard: WakeGuard::empty(),
            bridge,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.machine.snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn holds_wake_lock(&self) -> bool {
        self.guard.is_held()
    }

    pub fn handle_command(&mut self, command: Command) -> Transition {
        debug!("Applying command: {:?}", command);
        let transition = self.machine.apply(command, Instant::now());
        self.carry_out(&transition);
        transition
    }

    pub fn handle_tick(&mut self, tick: Tick) -> Transition {
        if !self.ticker.is_current(&tick) {
            debug!("Discarding stale tick from generation {}", tick.generation);
            return Transition::Ignored;
        }
        let transition = self.machine.tick(tick.at);
        self.carry_out(&transition);
        transition
    }

    /// Cancel ticking and release the wake hold; safe to repeat
    pub fn stop(&mut self) {
        self.ticker.cancel();
        self.guard.release();
    }

    fn carry_out(&mut self, transition: &Transition) {
        if transition.stops_ticking() {
            self.stop();
        }

        match transition {
            Transition::Started(snapshot) => {
                let hold_for = Duration::from_millis(snapshot.time_left_ms) + WAKE_MARGIN;
                self.guard.release();
                self.guard = WakeGuard::acquire(self.wake_lock.as_ref(), hold_for);
                let anchor = self.machine.anchor().unwrap_or_else(Instant::now);
                self.ticker.start(anchor, self.ticks_tx.clone());
                info!("Countdown running from {}", snapshot.clock_text());
            }
            Transition::Finished(_) => info!("Countdown finished"),
            Transition::Paused(snapshot) => info!("Countdown paused at {}", snapshot.clock_text()),
            Transition::Reset(snapshot) => info!("Countdown reset to {}", snapshot.clock_text()),
            Transition::Ticked(_) | Transition::Ignored => {}
        }

        if let Some(snapshot) = transition.snapshot() {
            self.bridge.publish(snapshot);
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
