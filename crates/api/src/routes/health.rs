//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use telemetry::{metrics, ComponentHealthReport, HealthStatus};

use crate::response::HealthResponse;
use crate::state::AppState;

fn component(name: &str, healthy: bool) -> ComponentHealthReport {
    ComponentHealthReport {
        name: name.to_string(),
        healthy,
        message: (!healthy).then(|| "Connection failed".to_string()),
    }
}

/// GET /health - Full health check.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let components = vec![
        component("redpanda", state.producer.is_healthy()),
        component("clickhouse", state.store.ping().await),
    ];
    let status = HealthStatus::aggregate(&components);
    let snapshot = metrics().snapshot();

    Json(HealthResponse {
        status: status.as_str().to_string(),
        components,
        events_published: snapshot.events_published,
        publish_errors: snapshot.publish_errors,
        track_requests: snapshot.track_requests,
    })
}

/// GET /health/ready - Readiness probe (queue reachable).
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if state.producer.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}
