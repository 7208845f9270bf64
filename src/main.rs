//! Focus Timer - A countdown timer service that keeps the machine awake
//!
//! This is the main entry point for the focus-timer application.

use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::watch};
use tracing::{info, warn};

use focus_timer::{
    config::Config,
    state::{AppState, Preferences},
    api::create_router,
    services::{check_inhibit_available, NoopWakeLock, SystemdInhibitor, WakeLock},
    tasks::{daily_reminder::Reminder, daily_reminder_task, foreground_host_task},
    utils::shutdown_signal,
};

/// How long the host gets to release the wake lock on shutdown
const HOST_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

async fn select_wake_lock(config: &Config) -> Arc<dyn WakeLock> {
    if config.no_wake_lock {
        info!("Wake lock disabled");
        return Arc::new(NoopWakeLock);
    }

    match check_inhibit_available().await {
        Ok(()) => Arc::new(SystemdInhibitor::new("focus-timer", "Countdown in progress")),
        Err(e) => {
            warn!("{}, countdowns will not keep the machine awake", e);
            Arc::new(NoopWakeLock)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focus_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focus-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, preferences={}",
          config.host, config.port, config.preferences.display());

    let preferences = Preferences::load(&config.preferences).unwrap_or_else(|e| {
        warn!("{}, using default durations", e);
        Preferences::default()
    });

    // Create application state
    let (state, commands) = AppState::new(
        config.port,
        config.host.clone(),
        preferences,
        config.preferences.clone(),
    );
    let state = Arc::new(state);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start the foreground host background task
    let wake_lock = select_wake_lock(&config).await;
    let host = tokio::spawn(foreground_host_task(
        state.host_deps(wake_lock),
        commands,
        shutdown_rx.clone(),
    ));

    for at in config.reminder_times() {
        tokio::spawn(daily_reminder_task(
            Reminder::at(*at),
            state.surface.clone(),
            shutdown_rx.clone(),
        ));
    }

    // Arm the timer with the focus duration
    if let Err(e) = state.reset(None) {
        warn!("Failed to arm timer: {}", e);
    }

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /timer/start        - Start or resume the countdown");
    info!("  POST /timer/pause        - Pause the countdown");
    info!("  POST /timer/toggle       - Toggle pause/play");
    info!("  POST /timer/reset        - Re-arm the countdown");
    info!("  POST /timer/mode/:mode   - Select focus, short-break or long-break");
    info!("  POST /timer/adjust       - Nudge the armed duration");
    info!("  POST /command            - Queue a raw command");
    info!("  GET  /status             - Check timer and surface status");
    info!("  GET  /events             - Stream timer snapshots");
    info!("  GET  /surface            - Show the status surface");
    info!("  POST /surface/dismiss    - Dismiss the finished alert");
    info!("  GET  /preferences        - Show mode durations");
    info!("  PUT  /preferences/:mode  - Change a mode duration");
    info!("  GET  /health             - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        signal = shutdown_signal() => {
            match signal {
                Ok(signal) => info!("Shutdown signal {} received", signal),
                Err(e) => tracing::error!("Failed to listen for signals: {}", e),
            }
        }
    }

    // Host drops its wake hold and surface on the way out
    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(HOST_SHUTDOWN_GRACE, host).await {
        Ok(Ok(exit)) => info!("Foreground host stopped: {:?}", exit),
        Ok(Err(e)) => tracing::error!("Foreground host panicked: {}", e),
        Err(_) => warn!("Foreground host did not stop in time"),
    }

    info!("Server shutdown complete");
    Ok(())
}
