//! Timer modes and persisted per-mode durations

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::PreferencesError;

const MINUTE_MS: u64 = 60_000;

/// Which kind of session the timer is armed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimerMode {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn default_minutes(self) -> u64 {
        match self {
            TimerMode::Focus => 25,
            TimerMode::ShortBreak => 5,
            TimerMode::LongBreak => 15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus",
            TimerMode::ShortBreak => "Short break",
            TimerMode::LongBreak => "Long break",
        }
    }
}

/// Duration in minutes for each mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_focus")]
    pub focus_minutes: u64,
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u64,
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u64,
}

fn default_focus() -> u64 {
    TimerMode::Focus.default_minutes()
}

fn default_short_break() -> u64 {
    TimerMode::ShortBreak.default_minutes()
}

fn default_long_break() -> u64 {
    TimerMode::LongBreak.default_minutes()
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            focus_minutes: default_focus(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
        }
    }
}

impl Preferences {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, PreferencesError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No preferences at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(PreferencesError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PreferencesError> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).map_err(|source| PreferencesError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Preferences saved to {}", path.display());
        Ok(())
    }

    pub fn minutes(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::ShortBreak => self.short_break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        }
    }

    pub fn set_minutes(&mut self, mode: TimerMode, minutes: u64) {
        match mode {
            TimerMode::Focus => self.focus_minutes = minutes,
            TimerMode::ShortBreak => self.short_break_minutes = minutes,
            TimerMode::LongBreak => self.long_break_minutes = minutes,
        }
    }

    pub fn duration_ms(&self, mode: TimerMode) -> u64 {
        self.minutes(mode).saturating_mul(MINUTE_MS)
    }
}
