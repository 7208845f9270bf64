//! CPU wake hold for the duration of a running countdown
//!
//! The platform side is the [`WakeLock`] trait. [`WakeGuard`] wraps whatever
//! hold it hands out and guarantees a single release on every exit path.

use std::{process::Stdio, time::Duration};

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::WakeError;

/// Extra time a hold outlives the countdown it covers
pub const WAKE_MARGIN: Duration = Duration::from_millis(2000);

const INHIBIT_PROGRAM: &str = "systemd-inhibit";

/// Source of wake holds
pub trait WakeLock: Send + Sync {
    /// Take a hold that expires on its own after `timeout`
    fn acquire(&self, timeout: Duration) -> Result<Box<dyn WakeHold>, WakeError>;
}

/// An acquired hold
pub trait WakeHold: Send {
    /// Give the hold back; called at most once by [`WakeGuard`]
    fn release(&mut self);
}

/// Scoped owner of at most one wake hold
///
/// Releasing twice, or releasing a guard that never acquired anything, does
/// nothing. Dropping releases.
#[derive(Default)]
pub struct WakeGuard {
    hold: Option<Box<dyn WakeHold>>,
}

impl WakeGuard {
    /// Guard holding nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Try to take a hold; failure is logged and yields an empty guard
    pub fn acquire(lock: &dyn WakeLock, timeout: Duration) -> Self {
        match lock.acquire(timeout) {
            Ok(hold) => {
                debug!("Wake hold acquired for {}ms", timeout.as_millis());
                Self { hold: Some(hold) }
            }
            Err(e) => {
                warn!("Countdown continues without wake hold: {}", e);
                Self::empty()
            }
        }
    }

    pub fn is_held(&self) -> bool {
        self.hold.is_some()
    }

    pub fn release(&mut self) {
        if let Some(mut hold) = self.hold.take() {
            hold.release();
            debug!("Wake hold released");
        }
    }
}

impl Drop for WakeGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for WakeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WakeGuard").field("held", &self.is_held()).finish()
    }
}

/// Wake lock that never holds anything, used when disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWakeLock;

struct NoopHold;

impl WakeHold for NoopHold {
    fn release(&mut self) {}
}

impl WakeLock for NoopWakeLock {
    fn acquire(&self, _timeout: Duration) -> Result<Box<dyn WakeHold>, WakeError> {
        Ok(Box::new(NoopHold))
    }
}

/// Blocks sleep and idle suspension through a `systemd-inhibit` child
///
/// The child runs `sleep <timeout>` so the inhibition lapses by itself even
/// if this process dies without releasing it.
#[derive(Debug, Clone)]
pub struct SystemdInhibitor {
    who: String,
    why: String,
}

impl SystemdInhibitor {
    pub fn new(who: impl Into<String>, why: impl Into<String>) -> Self {
        Self {
            who: who.into(),
            why: why.into(),
        }
    }
}

struct InhibitHold {
    child: Child,
}

impl WakeHold for InhibitHold {
    fn release(&mut self) {
        // Already exited when the timeout lapsed first
        if let Err(e) = self.child.start_kill() {
            debug!("Inhibitor already gone: {}", e);
        }
    }
}

impl WakeLock for SystemdInhibitor {
    fn acquire(&self, timeout: Duration) -> Result<Box<dyn WakeHold>, WakeError> {
        let seconds = timeout.as_millis().div_ceil(1000).max(1);

        let child = Command::new(INHIBIT_PROGRAM)
            .args(["--what=sleep:idle", "--mode=block"])
            .arg(format!("--who={}", self.who))
            .arg(format!("--why={}", self.why))
            .arg("sleep")
            .arg(seconds.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WakeError::Spawn {
                program: INHIBIT_PROGRAM,
                source,
            })?;

        Ok(Box::new(InhibitHold { child }))
    }
}

/// Check if systemd-inhibit is available on the system
pub async fn check_inhibit_available() -> Result<(), WakeError> {
    Command::new(INHIBIT_PROGRAM)
        .arg("--version")
        .output()
        .await
        .map_err(|_| WakeError::Unavailable(format!("{} is not installed", INHIBIT_PROGRAM)))?;

    info!("{} is available", INHIBIT_PROGRAM);
    Ok(())
}
