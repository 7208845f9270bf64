//! Timer snapshot structure

use serde::{Deserialize, Serialize};

use crate::utils::format_clock;

/// Immutable countdown state published on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Remaining countdown time in milliseconds
    pub time_left_ms: u64,
    /// Duration the current run/pause cycle was started or reset with
    pub duration_ms: u64,
    /// Whether the countdown is actively decrementing
    pub is_running: bool,
}

impl TimerSnapshot {
    /// Create a snapshot, `time_left_ms` must not exceed `duration_ms`
    pub fn new(time_left_ms: u64, duration_ms: u64, is_running: bool) -> Self {
        debug_assert!(time_left_ms <= duration_ms, "time left exceeds duration");
        Self {
            time_left_ms,
            duration_ms,
            is_running,
        }
    }

    /// A stopped timer armed with `duration_ms`
    pub fn armed(duration_ms: u64) -> Self {
        Self::new(duration_ms, duration_ms, false)
    }

    /// Same values, not running
    pub fn stopped(self) -> Self {
        Self {
            is_running: false,
            ..self
        }
    }

    /// Remaining time as `MM:SS`
    pub fn clock_text(&self) -> String {
        format_clock(self.time_left_ms)
    }

    /// Remaining share of the duration in percent, 100 when no duration is set
    pub fn progress_pct(&self) -> u32 {
        if self.duration_ms == 0 {
            return 100;
        }
        (self.time_left_ms as f64 / self.duration_ms as f64 * 100.0).round() as u32
    }
}
