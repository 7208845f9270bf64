//! Configuration and CLI argument handling

use std::path::PathBuf;

use chrono::NaiveTime;
use clap::Parser;

use crate::tasks::daily_reminder::parse_clock_time;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "focus-timer")]
#[command(about = "A countdown timer service that keeps the machine awake while it runs")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// File holding per-mode duration preferences
    #[arg(long, default_value = "focus-timer.json")]
    pub preferences: PathBuf,

    /// Daily reminder time as HH:MM, may be repeated
    #[arg(long = "reminder", value_parser = parse_clock_time, default_values = ["07:00", "21:00"])]
    pub reminders: Vec<NaiveTime>,

    /// Do not schedule daily reminders
    #[arg(long)]
    pub no_reminders: bool,

    /// Do not inhibit system sleep while a countdown runs
    #[arg(long)]
    pub no_wake_lock: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Reminder times to schedule, none when disabled
    pub fn reminder_times(&self) -> &[NaiveTime] {
        if self.no_reminders { &[] } else { &self.reminders }
    }
}
