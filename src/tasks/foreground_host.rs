//! Foreground execution host
//!
//! A host session owns one [`TimerEngine`], applies commands and ticks to it
//! on a single task, and keeps the status surface in step with every
//! published snapshot. The session ends itself when a countdown finishes;
//! the next command starts a fresh session seeded from the last snapshot.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::{
    services::{
        surface::{FinishedAlert, ProgressView, StatusSurface},
        wake_lock::WakeLock,
    },
    state::{machine::Transition, Command, StateBridge, TimerEngine},
    tasks::ticker::Tick,
};

/// Ordered queue of incoming commands
pub type CommandQueue = mpsc::UnboundedReceiver<Command>;

/// Everything a host session needs, shared across sessions
#[derive(Clone)]
pub struct HostDeps {
    pub bridge: StateBridge,
    pub wake_lock: Arc<dyn WakeLock>,
    pub surface: Arc<dyn StatusSurface>,
}

/// Why a host session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostExit {
    /// The countdown reached zero
    Finished,
    /// Shutdown was requested
    Shutdown,
    /// Every command sender is gone
    Disconnected,
}

/// One host session
pub struct ForegroundHost {
    engine: TimerEngine,
    ticks: mpsc::UnboundedReceiver<Tick>,
    surface: Arc<dyn StatusSurface>,
    surface_shown: bool,
}

impl ForegroundHost {
    pub fn new(deps: &HostDeps) -> Self {
        let (ticks_tx, ticks) = mpsc::unbounded_channel();
        Self {
            engine: TimerEngine::new(deps.bridge.clone(), Arc::clone(&deps.wake_lock), ticks_tx),
            ticks,
            surface: Arc::clone(&deps.surface),
            surface_shown: false,
        }
    }

    /// Run the session, starting with `first`, until the countdown finishes,
    /// shutdown is requested, or the command queue closes
    pub async fn run(
        mut self,
        first: Command,
        commands: &mut CommandQueue,
        shutdown: &mut watch::Receiver<bool>,
    ) -> HostExit {
        info!("Foreground host session started");
        if self.apply_command(first) {
            return HostExit::Finished;
        }

        loop {
            if *shutdown.borrow() {
                self.terminate();
                return HostExit::Shutdown;
            }

            tokio::select! {
                biased;

                _ = shutdown.changed() => {
                    self.terminate();
                    return HostExit::Shutdown;
                }

                command = commands.recv() => match command {
                    Some(command) => {
                        if self.apply_command(command) {
                            return HostExit::Finished;
                        }
                    }
                    None => {
                        self.terminate();
                        return HostExit::Disconnected;
                    }
                },

                Some(tick) = self.ticks.recv() => {
                    let transition = self.engine.handle_tick(tick);
                    if self.render(&transition) {
                        return HostExit::Finished;
                    }
                }
            }
        }
    }

    /// Returns true when the session is over
    fn apply_command(&mut self, command: Command) -> bool {
        let transition = self.engine.handle_command(command);
        self.render(&transition)
    }

    /// Mirror a transition onto the status surface; returns true on finish
    fn render(&mut self, transition: &Transition) -> bool {
        match transition {
            Transition::Started(snapshot) => {
                let alert = !self.surface_shown;
                self.surface.show_progress(&ProgressView::render(snapshot), alert);
                self.surface_shown = true;
            }
            Transition::Ticked(snapshot) | Transition::Paused(snapshot) => {
                if self.surface_shown {
                    self.surface.show_progress(&ProgressView::render(snapshot), false);
                }
            }
            Transition::Reset(_) => self.remove_surface(),
            Transition::Finished(_) => {
                self.remove_surface();
                self.surface.show_finished(&FinishedAlert::default());
                info!("Foreground host session finished");
                return true;
            }
            Transition::Ignored => {}
        }
        false
    }

    fn remove_surface(&mut self) {
        if self.surface_shown {
            self.surface.remove_progress();
            self.surface_shown = false;
        }
    }

    /// Forced termination: same cleanup as a normal stop
    fn terminate(&mut self) {
        info!("Foreground host terminating");
        self.engine.stop();
        self.remove_surface();
    }
}

/// Background task that creates a host session on demand and restarts one
/// for the next command after a countdown finishes
pub async fn foreground_host_task(
    deps: HostDeps,
    mut commands: CommandQueue,
    mut shutdown: watch::Receiver<bool>,
) -> HostExit {
    info!("Starting foreground host task");

    loop {
        if *shutdown.borrow() {
            return HostExit::Shutdown;
        }

        let first = tokio::select! {
            biased;

            _ = shutdown.changed() => return HostExit::Shutdown,
            command = commands.recv() => match command {
                Some(command) => command,
                None => return HostExit::Disconnected,
            },
        };

        debug!("Command {} wakes a new host session", first.name());
        let host = ForegroundHost::new(&deps);
        match host.run(first, &mut commands, &mut shutdown).await {
            HostExit::Finished => continue,
            exit => {
                info!("Foreground host task exiting: {:?}", exit);
                return exit;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use super::*;
    use crate::{
        services::{surface::ReminderAlert, wake_lock::NoopWakeLock},
        state::TimerSnapshot,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Shown {
        Progress { body: String, alert: bool },
        Removed,
        Finished,
    }

    #[derive(Default)]
    struct RecordingSurface(Mutex<Vec<Shown>>);

    impl RecordingSurface {
        fn events(&self) -> Vec<Shown> {
            self.0.lock().unwrap().clone()
        }
    }

    impl StatusSurface for RecordingSurface {
        fn show_progress(&self, view: &ProgressView, alert: bool) {
            self.0.lock().unwrap().push(Shown::Progress {
                body: view.body.clone(),
                alert,
            });
        }

        fn remove_progress(&self) {
            self.0.lock().unwrap().push(Shown::Removed);
        }

        fn show_finished(&self, _alert: &FinishedAlert) {
            self.0.lock().unwrap().push(Shown::Finished);
        }

        fn show_reminder(&self, _reminder: &ReminderAlert) {}
    }

    fn deps(surface: Arc<RecordingSurface>) -> HostDeps {
        HostDeps {
            bridge: StateBridge::new(TimerSnapshot::default()),
            wake_lock: Arc::new(NoopWakeLock),
            surface,
        }
    }

    fn progress(body: &str, alert: bool) -> Shown {
        Shown::Progress {
            body: body.to_string(),
            alert,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn alerts_only_on_first_appearance_and_finish() {
        let surface = Arc::new(RecordingSurface::default());
        let deps = deps(Arc::clone(&surface));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, mut shutdown) = watch::channel(false);

        let exit = ForegroundHost::new(&deps)
            .run(Command::Start { duration_ms: 2000 }, &mut rx, &mut shutdown)
            .await;
        drop(tx);

        assert_eq!(exit, HostExit::Finished);
        assert_eq!(
            surface.events(),
            vec![
                progress("Time left: 00:02", true),
                progress("Time left: 00:01", false),
                Shown::Removed,
                Shown::Finished,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_keeps_surface_and_reset_removes_it() {
        let surface = Arc::new(RecordingSurface::default());
        let deps = deps(Arc::clone(&surface));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, mut shutdown) = watch::channel(false);

        tx.send(Command::Pause).unwrap();
        tx.send(Command::TogglePausePlay).unwrap();
        tx.send(Command::Reset { duration_ms: 60_000 }).unwrap();
        drop(tx);

        let exit = ForegroundHost::new(&deps)
            .run(Command::Start { duration_ms: 60_000 }, &mut rx, &mut shutdown)
            .await;

        assert_eq!(exit, HostExit::Disconnected);
        assert_eq!(
            surface.events(),
            vec![
                progress("Time left: 01:00", true),
                progress("Time left: 01:00", false),
                progress("Time left: 01:00", false),
                Shown::Removed,
            ]
        );
        assert_eq!(deps.bridge.current(), TimerSnapshot::armed(60_000));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_run_cleans_up() {
        let surface = Arc::new(RecordingSurface::default());
        let deps = deps(Arc::clone(&surface));
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown) = watch::channel(false);

        let task = tokio::spawn(foreground_host_task(deps.clone(), rx, shutdown));
        tx.send(Command::Start { duration_ms: 60_000 }).unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        shutdown_tx.send(true).unwrap();
        assert_eq!(task.await.unwrap(), HostExit::Shutdown);
        assert_eq!(surface.events().last(), Some(&Shown::Removed));
        assert_eq!(deps.bridge.current(), TimerSnapshot::new(58_000, 60_000, true));
    }

    #[tokio::test(start_paused = true)]
    async fn next_command_after_finish_starts_new_session() {
        let surface = Arc::new(RecordingSurface::default());
        let deps = deps(Arc::clone(&surface));
        let (tx, rx) = mpsc::unbounded_channel();
        let (_shutdown_tx, shutdown) = watch::channel(false);
        let mut observer = deps.bridge.attach();

        let task = tokio::spawn(foreground_host_task(deps.clone(), rx, shutdown));
        tx.send(Command::Start { duration_ms: 1000 }).unwrap();
        while observer.next().await != Some(TimerSnapshot::new(0, 1000, false)) {}

        tx.send(Command::Start { duration_ms: 2000 }).unwrap();
        assert_eq!(observer.next().await, Some(TimerSnapshot::new(2000, 2000, true)));
        assert_eq!(observer.next().await, Some(TimerSnapshot::new(1000, 2000, true)));
        assert_eq!(observer.next().await, Some(TimerSnapshot::new(0, 2000, false)));

        drop(tx);
        assert_eq!(task.await.unwrap(), HostExit::Disconnected);
        let finished = surface.events().iter().filter(|e| **e == Shown::Finished).count();
        assert_eq!(finished, 2);
    }
}
