//! Admin session endpoint.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

/// Request body for opening an admin session.
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    /// The shared admin secret.
    pub secret: String,
}

/// Response carrying the minted session token.
#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    /// Bearer token for subsequent admin requests.
    pub token: String,
}

/// `POST /api/admin/session` — exchange the shared secret for a session.
pub async fn open_session(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    match state.sessions.begin(&request.secret) {
        Some(token) => Ok(Json(AdminLoginResponse { token })),
        None => Err(ApiError::unauthorized("Invalid admin secret")),
    }
}
