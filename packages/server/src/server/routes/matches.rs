//! Manual triggers and operator actions for matches

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::domains::matching::actions::complete_match;
use crate::domains::matching::{CycleError, MatchingError};
use crate::server::app::AppState;

#[derive(Serialize)]
pub struct TriggerResponse<T: Serialize> {
    success: bool,
    message: String,
    report: T,
}

fn cycle_error_response(e: CycleError) -> Response {
    let status = match &e {
        CycleError::AlreadyRunning(_) => StatusCode::CONFLICT,
        CycleError::Matching(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %e, "Manual trigger failed");
    }

    (
        status,
        Json(json!({
            "success": false,
            "message": "Failed to run cycle",
            "error": e.to_string(),
        })),
    )
        .into_response()
}

/// POST /api/trigger-matches
pub async fn trigger_matches_handler(Extension(state): Extension<AppState>) -> Response {
    tracing::info!("Manual pairing cycle requested");

    match state.runner.run_pairing_cycle(Utc::now()).await {
        Ok(report) => Json(TriggerResponse {
            success: true,
            message: format!("Created {} matches", report.created),
            report,
        })
        .into_response(),
        Err(e) => cycle_error_response(e),
    }
}

/// POST /api/follow-ups
pub async fn trigger_follow_ups_handler(Extension(state): Extension<AppState>) -> Response {
    tracing::info!("Manual follow-up sweep requested");

    match state.runner.run_follow_up_sweep(Utc::now()).await {
        Ok(report) => Json(TriggerResponse {
            success: true,
            message: format!("Checked {} active matches", report.checked),
            report,
        })
        .into_response(),
        Err(e) => cycle_error_response(e),
    }
}

/// POST /api/matches/:id/complete
pub async fn complete_match_handler(
    Extension(state): Extension<AppState>,
    Path(match_id): Path<String>,
) -> Response {
    match complete_match(&match_id, state.deps().store.as_ref()).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => {
            let status = match &e {
                MatchingError::MatchNotFound(_) => StatusCode::NOT_FOUND,
                MatchingError::AlreadyCompleted(_) => StatusCode::CONFLICT,
                _ => {
                    tracing::error!(match_id = %match_id, error = %e, "Failed to complete match");
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (
                status,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
