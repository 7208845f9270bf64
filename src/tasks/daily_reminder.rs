//! Daily reminder background task

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone, Timelike};
use tokio::{sync::watch, time::sleep};
use tracing::{debug, info, warn};

use crate::services::surface::{ReminderAlert, StatusSurface};

pub const REMINDER_TITLE: &str = "A message for you";

/// A reminder that fires every day at a fixed local time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub at: NaiveTime,
    pub message: String,
}

impl Reminder {
    /// Reminder with a greeting that suits the time of day
    pub fn at(at: NaiveTime) -> Self {
        let message = match at.hour() {
            4..=11 => "Good morning! Time to start the day with a fresh cup of coffee.",
            18..=23 | 0..=3 => "Good night! You did great today, rest well.",
            _ => "Time for a short check-in. How is your focus?",
        };
        Self {
            at,
            message: message.to_string(),
        }
    }

    pub fn alert(&self) -> ReminderAlert {
        ReminderAlert {
            title: REMINDER_TITLE.to_string(),
            message: self.message.clone(),
        }
    }
}

/// Parse `HH:MM` from the command line
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| format!("expected HH:MM, got {:?}: {}", value, e))
}

/// Next occurrence of `at` strictly after `now`: today if still ahead,
/// otherwise tomorrow. `None` if the local time does not exist on either day.
pub fn next_fire<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Option<DateTime<Tz>> {
    let today = now.date_naive();
    [today, today.checked_add_days(Days::new(1))?]
        .into_iter()
        .filter_map(|day| now.timezone().from_local_datetime(&day.and_time(at)).earliest())
        .find(|candidate| candidate > now)
}

/// Background task that shows `reminder` through the surface once a day
pub async fn daily_reminder_task(
    reminder: Reminder,
    surface: Arc<dyn StatusSurface>,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Scheduling daily reminder at {}", reminder.at.format("%H:%M"));

    loop {
        if *shutdown.borrow() {
            return;
        }

        let now = Local::now();
        let (wait, fires) = match next_fire(&now, reminder.at) {
            Some(next) => {
                debug!("Next reminder at {}", next);
                ((next - now).to_std().unwrap_or(Duration::ZERO), true)
            }
            None => {
                warn!("No valid local time for reminder at {}, retrying in an hour", reminder.at);
                (Duration::from_secs(3600), false)
            }
        };

        tokio::select! {
            _ = sleep(wait) => {
                if fires {
                    surface.show_reminder(&reminder.alert());
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}
