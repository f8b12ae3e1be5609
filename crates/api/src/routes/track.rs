//! Ingress endpoint.
//!
//! Validates a single activity, assigns `created_at` when the caller left it
//! out, and publishes it to Redpanda. A `202` means the event is durably
//! queued, not yet stored.

use activity_core::{limits::MAX_TRACK_BODY_BYTES, TrackRequest};
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chrono::Utc;
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::response::{ApiError, TrackResponse};
use crate::state::AppState;

/// POST /track
pub async fn track_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<TrackResponse>), ApiError> {
    metrics().track_requests.inc();

    if body.len() > MAX_TRACK_BODY_BYTES {
        metrics().track_validation_failures.inc();
        return Err(ApiError::validation(vec![format!(
            "Payload size {} bytes exceeds {} byte limit",
            body.len(),
            MAX_TRACK_BODY_BYTES
        )]));
    }

    let activity = TrackRequest::parse(&body)
        .and_then(|req| req.into_activity(Utc::now()))
        .map_err(|e| {
            metrics().track_validation_failures.inc();
            debug!(error = %e, "Rejected track request");
            ApiError::from(e)
        })?;

    let receipt = state.producer.publish(&activity).await.map_err(|e| {
        warn!(user_id = %activity.user_id, error = %e, "Failed to publish activity");
        ApiError::from(e)
    })?;

    info!(
        user_id = %activity.user_id,
        action = %activity.action,
        partition = receipt.partition,
        offset = receipt.offset,
        "Activity queued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(TrackResponse {
            success: true,
            partition: receipt.partition,
            offset: receipt.offset,
            created_at: activity.created_at,
        }),
    ))
}
