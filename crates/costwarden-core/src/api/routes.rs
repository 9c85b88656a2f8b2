//! API routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, MonitorState, RelayState};

/// Router for the cost monitor service
pub fn monitor_router(state: MonitorState) -> Router {
    Router::new()
        .route("/", post(handlers::run_monitor))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Router for the notification relay service
pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/", post(handlers::receive_alert))
        .route("/health", get(handlers::health))
        .with_state(state)
}
