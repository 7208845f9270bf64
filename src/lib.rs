//! Focus Timer - A countdown timer service that keeps the machine awake
//!
//! This library provides a pausable one-second countdown engine, a
//! foreground host that holds a sleep inhibitor while the countdown runs,
//! an ordered snapshot stream for observers and an HTTP command surface.

pub mod config;
pub mod error;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, Command, StateBridge, TimerSnapshot};
pub use api::create_router;
pub use utils::signals::shutdown_signal;
