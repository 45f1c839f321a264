//! HTTP endpoints.

pub mod admin;
pub mod attendance;
pub mod checkin;
pub mod export;
pub mod guests;
pub mod rsvp;

use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Proof of a live admin session, extracted from `Authorization: Bearer`.
///
/// Use as a handler parameter to gate registry and ledger views.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

#[async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected 'Bearer <token>'"))?;

        if state.sessions.verify(token) {
            Ok(Self)
        } else {
            Err(ApiError::unauthorized("Invalid or expired admin session"))
        }
    }
}
