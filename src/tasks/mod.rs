//! Background tasks module
//!
//! This module contains the tasks that run alongside the HTTP server: the
//! foreground host with its ticker, and the daily reminders.

pub mod daily_reminder;
pub mod foreground_host;
pub mod ticker;

// Re-export main functions
pub use daily_reminder::daily_reminder_task;
pub use foreground_host::foreground_host_task;
