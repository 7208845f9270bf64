//! Commands accepted by the foreground host

use serde::{Deserialize, Serialize};

/// An instruction for the timer engine, processed strictly in arrival order
///
/// Durations are signed so non-positive input can be expressed and rejected
/// by the engine instead of failing at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Begin counting down, or resume remaining time
    Start { duration_ms: i64 },
    /// Stop ticking and keep the remaining time
    Pause,
    /// Stop ticking and arm the timer with a new duration
    Reset { duration_ms: i64 },
    /// Pause when running, otherwise resume with whatever time is left
    TogglePausePlay,
    /// Re-arm with the armed duration nudged by `delta_ms`, or with
    /// `fallback_ms` nudged when nothing is armed; ignored while running
    Adjust { delta_ms: i64, fallback_ms: i64 },
    /// Reset unless a countdown is running
    Rearm { duration_ms: i64 },
}

impl Command {
    /// Short name used for last-action tracking and logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Pause => "pause",
            Command::Reset { .. } => "reset",
            Command::TogglePausePlay => "toggle",
            Command::Adjust { .. } => "adjust",
            Command::Rearm { .. } => "rearm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_json() {
        let cmd: Command = serde_json::from_str(r#"{"action":"start","duration_ms":3000}"#).unwrap();
        assert_eq!(cmd, Command::Start { duration_ms: 3000 });

        let cmd: Command = serde_json::from_str(r#"{"action":"toggle_pause_play"}"#).unwrap();
        assert_eq!(cmd, Command::TogglePausePlay);
    }

    #[test]
    fn accepts_negative_durations() {
        let cmd: Command = serde_json::from_str(r#"{"action":"reset","duration_ms":-5}"#).unwrap();
        assert_eq!(cmd, Command::Reset { duration_ms: -5 });
    }

    #[test]
    fn conditional_commands_carry_their_fields() {
        let cmd: Command =
            serde_json::from_str(r#"{"action":"adjust","delta_ms":-60000,"fallback_ms":1500000}"#).unwrap();
        assert_eq!(cmd, Command::Adjust { delta_ms: -60_000, fallback_ms: 1_500_000 });
        assert_eq!(cmd.name(), "adjust");

        let cmd: Command = serde_json::from_str(r#"{"action":"rearm","duration_ms":300000}"#).unwrap();
        assert_eq!(cmd.name(), "rearm");
    }
}
