//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::surface::SurfaceState,
    state::{Command, Preferences, TimerMode, TimerSnapshot},
};

/// Optional duration carried by start and reset requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DurationRequest {
    pub duration_ms: Option<i64>,
}

/// Body of an adjust request
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustRequest {
    pub delta_ms: i64,
}

/// Body of a preference update
#[derive(Debug, Clone, Deserialize)]
pub struct MinutesRequest {
    pub minutes: u64,
}

/// Response for command endpoints
///
/// Commands are applied asynchronously by the foreground host, so `timer`
/// is the snapshot current when the command was queued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub command: Option<Command>,
    pub timer: TimerSnapshot,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, command: Option<Command>, timer: TimerSnapshot) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            command,
            timer,
        }
    }

    /// Command was queued for the host
    pub fn accepted(command: Command, timer: TimerSnapshot) -> Self {
        Self::new(
            "accepted",
            format!("{} queued", command.name()),
            Some(command),
            timer,
        )
    }

    /// Request needed no command
    pub fn ignored(message: String, timer: TimerSnapshot) -> Self {
        Self::new("ignored", message, None, timer)
    }
}

/// Full status with timer, surface and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub clock: String,
    pub progress_pct: u32,
    pub mode: TimerMode,
    pub surface: SurfaceState,
    pub observers: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Preferences together with the selected mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub mode: TimerMode,
    pub preferences: Preferences,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
