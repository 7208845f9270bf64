//! One-second ticker driving a running countdown

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::state::machine::TICK;

/// Tick event tagged with the generation of the ticker that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
    pub at: Instant,
}

/// Repeating task sending one [`Tick`] per elapsed second since an anchor
///
/// Cancelling aborts the task and bumps the generation, so a tick that was
/// already queued before cancellation is recognisably stale.
#[derive(Debug, Default)]
pub struct Ticker {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking at `anchor + 1s`, `anchor + 2s`, ... replacing any
    /// previous run. Missed deadlines are skipped rather than replayed.
    pub fn start(&mut self, anchor: Instant, ticks: mpsc::UnboundedSender<Tick>) -> u64 {
        self.cancel();
        let generation = self.generation;

        self.task = Some(tokio::spawn(async move {
            let mut interval = interval_at(anchor + TICK, TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let tick = Tick {
                    generation,
                    at: Instant::now(),
                };
                if ticks.send(tick).is_err() {
                    debug!("Tick receiver gone, ticker {} exiting", generation);
                    break;
                }
            }
        }));

        debug!("Ticker started (generation {})", generation);
        generation
    }

    /// Stop ticking; safe to call when not running
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Ticker cancelled (generation {})", self.generation);
        }
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Whether `tick` came from the live run
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.task.is_some() && tick.generation == self.generation
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
