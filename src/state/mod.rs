//! State management module
//!
//! This module contains the countdown state machine, the engine that owns it,
//! the observer bridge, and the application state around them.

pub mod app_state;
pub mod bridge;
pub mod command;
pub mod engine;
pub mod machine;
pub mod preferences;
pub mod snapshot;

// Re-export main types
pub use app_state::AppState;
pub use bridge::{Observer, StateBridge};
pub use command::Command;
pub use engine::TimerEngine;
pub use machine::{Phase, TimerMachine, Transition};
pub use preferences::{Preferences, TimerMode};
pub use snapshot::TimerSnapshot;
