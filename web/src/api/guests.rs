//! Admin guest-list endpoints.

use super::AdminAccess;
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use soiree_checkin::model::Guest;

/// Admin pre-registration request.
#[derive(Debug, Deserialize)]
pub struct CreateGuestRequest {
    /// Guest name.
    pub name: String,
    /// Optional contact email.
    pub email: Option<String>,
    /// Optional contact phone.
    pub phone: Option<String>,
}

/// Dashboard counters.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Guests on the list.
    pub total: usize,
    /// Guests with any recorded response.
    pub responded: usize,
    /// Guests who confirmed attendance.
    pub attending: usize,
    /// Guests already checked in.
    pub checked_in: usize,
}

/// `GET /api/guests` — the guest list, newest first.
pub async fn list(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<Json<Vec<Guest>>, ApiError> {
    Ok(Json(state.registry.list().await?))
}

/// `POST /api/guests` — pre-register a guest; the credential is issued
/// immediately even though no response has been recorded.
pub async fn create(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(request): Json<CreateGuestRequest>,
) -> Result<(StatusCode, Json<Guest>), ApiError> {
    let guest = state
        .registry
        .create_pending(&request.name, request.email, request.phone)
        .await?;
    Ok((StatusCode::CREATED, Json(guest)))
}

/// `GET /api/stats` — dashboard counters.
pub async fn stats(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = state.registry.stats().await?;
    let checked_in = state.ledger.list().await?.len();
    Ok(Json(StatsResponse {
        total: stats.total,
        responded: stats.responded,
        attending: stats.attending,
        checked_in,
    }))
}
