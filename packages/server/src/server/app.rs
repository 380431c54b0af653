//! Application setup and server configuration.

use std::time::Instant;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::domains::matching::CycleRunner;
use crate::kernel::ServerDeps;
use crate::server::routes::{
    complete_match_handler, health_handler, trigger_follow_ups_handler, trigger_matches_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub runner: CycleRunner,
    pub started_at: Instant,
    /// Result of the startup connection check against the chat platform
    pub slack_connected: bool,
}

impl AppState {
    pub fn new(runner: CycleRunner, slack_connected: bool) -> Self {
        Self {
            runner,
            started_at: Instant::now(),
            slack_connected,
        }
    }

    pub fn deps(&self) -> &ServerDeps {
        self.runner.deps()
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/trigger-matches", post(trigger_matches_handler))
        .route("/api/follow-ups", post(trigger_follow_ups_handler))
        .route("/api/matches/:id/complete", post(complete_match_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}
