//! Main application state management

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{Command, Preferences, StateBridge, TimerMode, TimerSnapshot};
use crate::{
    services::{surface::ShellSurface, wake_lock::WakeLock},
    tasks::foreground_host::{CommandQueue, HostDeps},
};

fn saturating_ms(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

/// Main application state shared by the HTTP handlers and background tasks
#[derive(Debug)]
pub struct AppState {
    /// Live timer snapshot stream
    pub bridge: StateBridge,
    /// Status surface shown by the foreground host
    pub surface: Arc<ShellSurface>,
    /// Ordered command queue consumed by the foreground host task
    commands: mpsc::UnboundedSender<Command>,
    /// Duration preferences and the selected mode
    pub preferences: Arc<Mutex<Preferences>>,
    preferences_path: PathBuf,
    pub mode: Arc<Mutex<TimerMode>>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Create the state and the command queue the foreground host consumes
    pub fn new(
        port: u16,
        host: String,
        preferences: Preferences,
        preferences_path: PathBuf,
    ) -> (Self, CommandQueue) {
        let (commands, queue) = mpsc::unbounded_channel();

        let state = Self {
            bridge: StateBridge::new(TimerSnapshot::default()),
            surface: Arc::new(ShellSurface::new()),
            commands,
            preferences: Arc::new(Mutex::new(preferences)),
            preferences_path,
            mode: Arc::new(Mutex::new(TimerMode::default())),
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        };
        (state, queue)
    }

    /// Dependencies for foreground host sessions
    pub fn host_deps(&self, wake_lock: Arc<dyn WakeLock>) -> HostDeps {
        HostDeps {
            bridge: self.bridge.clone(),
            wake_lock,
            surface: self.surface.clone(),
        }
    }

    /// Queue a command for the foreground host and record it as last action
    pub fn dispatch(&self, command: Command) -> Result<(), String> {
        self.commands
            .send(command)
            .map_err(|_| "Foreground host is not running".to_string())?;

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(command.name().to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
        Ok(())
    }

    /// Start with the given duration, or the current mode's duration
    pub fn start(&self, duration_ms: Option<i64>) -> Result<Command, String> {
        let duration_ms = match duration_ms {
            Some(ms) => ms,
            None => self.mode_duration_ms(self.current_mode()?)?,
        };
        let command = Command::Start { duration_ms };
        self.dispatch(command)?;
        Ok(command)
    }

    /// Reset to the given duration, or re-arm the current mode
    pub fn reset(&self, duration_ms: Option<i64>) -> Result<Command, String> {
        match duration_ms {
            Some(duration_ms) => {
                let command = Command::Reset { duration_ms };
                self.dispatch(command)?;
                Ok(command)
            }
            None => self.select_mode(self.current_mode()?, true),
        }
    }

    /// Switch modes; re-arms the timer when the mode changes or `force` is set
    pub fn select_mode(&self, mode: TimerMode, force: bool) -> Result<Command, String> {
        let mut current = self.mode
            .lock()
            .map_err(|e| format!("Failed to lock timer mode: {}", e))?;

        let duration_ms = self.mode_duration_ms(mode)?;
        let command = Command::Reset { duration_ms };
        if *current != mode || force {
            info!("Selecting {} mode ({}ms)", mode.label(), duration_ms);
            *current = mode;
            drop(current);
            self.dispatch(command)?;
        }
        Ok(command)
    }

    /// Nudge the armed duration; the host ignores it while running
    pub fn adjust_duration(&self, delta_ms: i64) -> Result<Command, String> {
        let command = Command::Adjust {
            delta_ms,
            fallback_ms: self.mode_duration_ms(self.current_mode()?)?,
        };
        self.dispatch(command)?;
        Ok(command)
    }

    /// Store a new duration for `mode`; re-arms the timer when that mode is
    /// selected, unless the host has a countdown running
    pub fn set_preference(&self, mode: TimerMode, minutes: u64) -> Result<Preferences, String> {
        let updated = {
            let mut prefs = self.preferences
                .lock()
                .map_err(|e| format!("Failed to lock preferences: {}", e))?;
            prefs.set_minutes(mode, minutes);
            prefs.clone()
        };

        if let Err(e) = updated.save(&self.preferences_path) {
            warn!("Failed to persist preferences: {}", e);
        }

        if self.current_mode()? == mode {
            self.dispatch(Command::Rearm {
                duration_ms: saturating_ms(updated.duration_ms(mode)),
            })?;
        }
        Ok(updated)
    }

    /// Get current preferences
    pub fn get_preferences(&self) -> Result<Preferences, String> {
        self.preferences
            .lock()
            .map(|prefs| prefs.clone())
            .map_err(|e| format!("Failed to lock preferences: {}", e))
    }

    /// Get the selected mode
    pub fn current_mode(&self) -> Result<TimerMode, String> {
        self.mode
            .lock()
            .map(|mode| *mode)
            .map_err(|e| format!("Failed to lock timer mode: {}", e))
    }

    fn mode_duration_ms(&self, mode: TimerMode) -> Result<i64, String> {
        Ok(saturating_ms(self.get_preferences()?.duration_ms(mode)))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
