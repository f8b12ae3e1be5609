//! Query endpoint.

use activity_core::Activity;
use axum::{extract::State, Json};
use tracing::error;

use crate::response::ApiError;
use crate::state::AppState;

/// GET /activities - every stored activity, newest first.
///
/// A failed scan returns an error with no partial body.
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<Activity>>, ApiError> {
    let activities = state.store.list_activities().await.map_err(|e| {
        error!(error = %e, "Failed to list activities");
        ApiError::from(e)
    })?;

    Ok(Json(activities))
}
