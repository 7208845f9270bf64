//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tracing::{debug, error, info};

use crate::{
    services::surface::SurfaceState,
    state::{AppState, Command, TimerMode},
};
use super::responses::{
    AdjustRequest, ApiResponse, DurationRequest, HealthResponse, MinutesRequest,
    PreferencesResponse, StatusResponse,
};

type HandlerResult<T> = Result<Json<T>, StatusCode>;

fn internal_error(context: &str, e: String) -> StatusCode {
    error!("{}: {}", context, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

fn accepted(state: &AppState, command: Command) -> HandlerResult<ApiResponse> {
    info!("Command accepted: {:?}", command);
    Ok(Json(ApiResponse::accepted(command, state.bridge.current())))
}

/// Handle POST /timer/start - Start or resume the countdown
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<DurationRequest>>,
) -> HandlerResult<ApiResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    match state.start(request.duration_ms) {
        Ok(command) => accepted(&state, command),
        Err(e) => Err(internal_error("Failed to start timer", e)),
    }
}

/// Handle POST /timer/pause - Pause the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    dispatch(&state, Command::Pause)
}

/// Handle POST /timer/toggle - Pause when running, resume otherwise
pub async fn toggle_handler(State(state): State<Arc<AppState>>) -> HandlerResult<ApiResponse> {
    dispatch(&state, Command::TogglePausePlay)
}

/// Handle POST /timer/reset - Re-arm with a duration or the current mode
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    body: Option<Json<DurationRequest>>,
) -> HandlerResult<ApiResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    match state.reset(request.duration_ms) {
        Ok(command) => accepted(&state, command),
        Err(e) => Err(internal_error("Failed to reset timer", e)),
    }
}

/// Handle POST /timer/mode/:mode - Select a timer mode
pub async fn mode_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<TimerMode>,
) -> HandlerResult<ApiResponse> {
    match state.current_mode() {
        Ok(current) if current == mode => {
            return Ok(Json(ApiResponse::ignored(
                format!("{} mode already selected", mode.label()),
                state.bridge.current(),
            )));
        }
        Ok(_) => {}
        Err(e) => return Err(internal_error("Failed to read timer mode", e)),
    }

    match state.select_mode(mode, false) {
        Ok(command) => accepted(&state, command),
        Err(e) => Err(internal_error("Failed to select mode", e)),
    }
}

/// Handle POST /timer/adjust - Nudge the armed duration while stopped
pub async fn adjust_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustRequest>,
) -> HandlerResult<ApiResponse> {
    match state.adjust_duration(request.delta_ms) {
        Ok(command) => accepted(&state, command),
        Err(e) => Err(internal_error("Failed to adjust duration", e)),
    }
}

/// Handle POST /command - Queue a raw command
pub async fn command_handler(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> HandlerResult<ApiResponse> {
    dispatch(&state, command)
}

fn dispatch(state: &AppState, command: Command) -> HandlerResult<ApiResponse> {
    match state.dispatch(command) {
        Ok(()) => accepted(state, command),
        Err(e) => Err(internal_error("Failed to queue command", e)),
    }
}

/// Handle GET /status - Return timer, surface and server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> HandlerResult<StatusResponse> {
    let surface = state.surface.state()
        .map_err(|e| internal_error("Failed to get surface state", e))?;
    let mode = state.current_mode()
        .map_err(|e| internal_error("Failed to get timer mode", e))?;

    let timer = state.bridge.current();
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        clock: timer.clock_text(),
        progress_pct: timer.progress_pct(),
        mode,
        surface,
        observers: state.bridge.observer_count(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /events - Stream snapshots as server-sent events
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let observer = state.bridge.attach();
    debug!("Event stream opened");

    let stream = stream::unfold(observer, |mut observer| async move {
        let snapshot = observer.next().await?;
        let event = Event::default()
            .event("snapshot")
            .json_data(snapshot)
            .unwrap_or_else(|e| Event::default().comment(format!("encode failed: {}", e)));
        Some((Ok::<_, Infallible>(event), observer))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /surface - Return what the status surface shows
pub async fn surface_handler(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<SurfaceState> {
    state.surface.state()
        .map(Json)
        .map_err(|e| internal_error("Failed to get surface state", e))
}

/// Handle POST /surface/dismiss - Dismiss the finished alert
pub async fn dismiss_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.surface.dismiss_finished() {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => internal_error("Failed to dismiss alert", e),
    }
}

/// Handle GET /preferences - Return durations and the selected mode
pub async fn preferences_handler(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<PreferencesResponse> {
    let preferences = state.get_preferences()
        .map_err(|e| internal_error("Failed to get preferences", e))?;
    let mode = state.current_mode()
        .map_err(|e| internal_error("Failed to get timer mode", e))?;
    Ok(Json(PreferencesResponse { mode, preferences }))
}

/// Handle PUT /preferences/:mode - Change one mode's duration
pub async fn set_preference_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<TimerMode>,
    Json(request): Json<MinutesRequest>,
) -> HandlerResult<PreferencesResponse> {
    let preferences = state.set_preference(mode, request.minutes)
        .map_err(|e| internal_error("Failed to set preference", e))?;
    let mode = state.current_mode()
        .map_err(|e| internal_error("Failed to get timer mode", e))?;
    info!("Preferences updated: {:?}", preferences);
    Ok(Json(PreferencesResponse { mode, preferences }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
