//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.
//! It is the command channel into the foreground host and exposes the
//! snapshot stream to remote observers.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timer/start", post(start_handler))
        .route("/timer/pause", post(pause_handler))
        .route("/timer/toggle", post(toggle_handler))
        .route("/timer/reset", post(reset_handler))
        .route("/timer/mode/:mode", post(mode_handler))
        .route("/timer/adjust", post(adjust_handler))
        .route("/command", post(command_handler))
        .route("/status", get(status_handler))
        .route("/events", get(events_handler))
        .route("/surface", get(surface_handler))
        .route("/surface/dismiss", post(dismiss_handler))
        .route("/preferences", get(preferences_handler))
        .route("/preferences/:mode", put(set_preference_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
