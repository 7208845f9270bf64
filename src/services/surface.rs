//! Status surface rendered by the foreground host

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::state::{Command, TimerSnapshot};

pub const PROGRESS_TITLE: &str = "Focus timer";

/// Platform shell that shows the host's status surface and alerts
pub trait StatusSurface: Send + Sync {
    /// Show or update the progress surface; `alert` is true only for its
    /// first appearance in a session
    fn show_progress(&self, view: &ProgressView, alert: bool);
    fn remove_progress(&self);
    /// One-shot alert at the end of a countdown
    fn show_finished(&self, alert: &FinishedAlert);
    fn show_reminder(&self, reminder: &ReminderAlert);
}

/// The single contextual action on the progress surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceAction {
    pub label: String,
    pub icon: String,
    pub command: Command,
}

/// Rendered progress surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressView {
    pub title: String,
    pub body: String,
    pub action: SurfaceAction,
    pub progress_pct: u32,
}

impl ProgressView {
    pub fn render(snapshot: &TimerSnapshot) -> Self {
        let (label, icon) = if snapshot.is_running {
            ("Pause", "media-playback-pause")
        } else {
            ("Resume", "media-playback-start")
        };
        Self {
            title: PROGRESS_TITLE.to_string(),
            body: format!("Time left: {}", snapshot.clock_text()),
            action: SurfaceAction {
                label: label.to_string(),
                icon: icon.to_string(),
                command: Command::TogglePausePlay,
            },
            progress_pct: snapshot.progress_pct(),
        }
    }
}

/// Alert shown once a countdown completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedAlert {
    pub title: String,
    pub body: String,
    pub sound: String,
    /// Alternating off/on durations in milliseconds
    pub vibration_ms: Vec<u64>,
    /// Dismissed when acted upon
    pub auto_cancel: bool,
}

impl Default for FinishedAlert {
    fn default() -> Self {
        Self {
            title: "Time's up!".to_string(),
            body: "Nice work. Time for a break.".to_string(),
            sound: "bubbles".to_string(),
            vibration_ms: vec![0, 500, 200, 500],
            auto_cancel: true,
        }
    }
}

/// Daily reminder notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderAlert {
    pub title: String,
    pub message: String,
}

/// What the shell currently displays
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurfaceState {
    pub progress: Option<ProgressView>,
    pub finished: Option<FinishedAlert>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_reminder: Option<ReminderAlert>,
    pub last_reminder_at: Option<DateTime<Utc>>,
}

/// Surface kept in memory for the HTTP status endpoints and mirrored to logs
#[derive(Debug, Default)]
pub struct ShellSurface {
    state: Mutex<SurfaceState>,
}

impl ShellSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current surface contents
    pub fn state(&self) -> Result<SurfaceState, String> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|e| format!("Failed to lock surface state: {}", e))
    }

    /// Dismiss the finished alert; returns whether one was showing
    pub fn dismiss_finished(&self) -> Result<bool, String> {
        let mut state = self.state
            .lock()
            .map_err(|e| format!("Failed to lock surface state: {}", e))?;
        state.finished_at = None;
        Ok(state.finished.take().is_some())
    }

    fn update<F: FnOnce(&mut SurfaceState)>(&self, updater: F) {
        match self.state.lock() {
            Ok(mut state) => updater(&mut *state),
            Err(poisoned) => updater(&mut *poisoned.into_inner()),
        }
    }
}

impl StatusSurface for ShellSurface {
    fn show_progress(&self, view: &ProgressView, alert: bool) {
        if alert {
            info!("{}: {} [{}]", view.title, view.body, view.action.label);
        } else {
            debug!("{}: {} ({}%)", view.title, view.body, view.progress_pct);
        }
        self.update(|state| state.progress = Some(view.clone()));
    }

    fn remove_progress(&self) {
        debug!("Progress surface removed");
        self.update(|state| state.progress = None);
    }

    fn show_finished(&self, alert: &FinishedAlert) {
        info!("{} {} (sound: {})", alert.title, alert.body, alert.sound);
        self.update(|state| {
            state.finished = Some(alert.clone());
            state.finished_at = Some(Utc::now());
        });
    }

    fn show_reminder(&self, reminder: &ReminderAlert) {
        info!("{}: {}", reminder.title, reminder.message);
        self.update(|state| {
            state.last_reminder = Some(reminder.clone());
            state.last_reminder_at = Some(Utc::now());
        });
    }
}
