//! Admin attendance view.

use super::AdminAccess;
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use soiree_checkin::model::CheckedInGuest;

/// `GET /api/attendance` — check-ins joined with guests, newest first.
pub async fn list(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<Json<Vec<CheckedInGuest>>, ApiError> {
    Ok(Json(state.ledger.list().await?))
}
