use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::domains::matching::MatchRecord;
use crate::server::app::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    active_matches: usize,
    /// Seconds since startup
    uptime: u64,
    slack_connected: bool,
    store: StoreHealth,
}

#[derive(Serialize)]
pub struct StoreHealth {
    backend: &'static str,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Checks:
/// - Store connectivity and responsiveness
/// - Number of active matches
///
/// Returns 200 OK if the store answers, 503 Service Unavailable otherwise.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let store = state.deps().store.as_ref();

    let probe = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        store.ping().await?;
        MatchRecord::find_active(store).await
    })
    .await;

    let (store_health, active_matches) = match probe {
        Ok(Ok(active)) => (
            StoreHealth {
                backend: store.backend(),
                status: "ok".to_string(),
                error: None,
            },
            active.len(),
        ),
        Ok(Err(e)) => (
            StoreHealth {
                backend: store.backend(),
                status: "error".to_string(),
                error: Some(format!("Store check failed: {}", e)),
            },
            0,
        ),
        Err(_) => (
            StoreHealth {
                backend: store.backend(),
                status: "error".to_string(),
                error: Some("Store timeout (>5s)".to_string()),
            },
            0,
        ),
    };

    let is_healthy = store_health.status == "ok";
    let (status_code, overall_status) = if is_healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status_code,
        Json(HealthResponse {
            status: overall_status.to_string(),
            active_matches,
            uptime: state.started_at.elapsed().as_secs(),
            slack_connected: state.slack_connected,
            store: store_health,
        }),
    )
}
