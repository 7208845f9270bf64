//! Platform service module
//!
//! This module contains the platform-facing pieces the timer relies on: the
//! wake lock that keeps the machine awake and the status surface.

pub mod surface;
pub mod wake_lock;

// Re-export main types
pub use surface::{ShellSurface, StatusSurface};
pub use wake_lock::{check_inhibit_available, NoopWakeLock, SystemdInhibitor, WakeGuard, WakeLock};
