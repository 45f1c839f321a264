//! The check-in endpoint operator stations post scanned tokens to.

use super::AdminAccess;
use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use soiree_checkin::model::Credential;
use soiree_checkin::resolver::{RejectReason, ResolvePort, Resolution};

/// A scanned token.
#[derive(Debug, Deserialize)]
pub struct CheckinRequest {
    /// The decoded QR payload.
    pub token: String,
}

/// Resolution outcome for the operator.
///
/// Every resolution — admission or rejection — is a successful HTTP
/// response; only infrastructure failures surface as errors. Each rejection
/// reason carries its own message so door staff can act on it.
#[derive(Debug, Serialize)]
pub struct CheckinResponse {
    /// `"welcomed"` or `"rejected"`.
    pub outcome: &'static str,
    /// Rejection reason, when rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    /// Admitted guest's name, when welcomed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    /// Operator-facing message.
    pub message: String,
}

/// `POST /api/checkin` — resolve a scanned token.
pub async fn resolve(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(request): Json<CheckinRequest>,
) -> Result<Json<CheckinResponse>, ApiError> {
    let token = Credential::from(request.token);
    let resolution = state.resolver.resolve(&token).await?;
    let message = resolution.message();

    let response = match resolution {
        Resolution::Welcomed { guest_name } => CheckinResponse {
            outcome: "welcomed",
            reason: None,
            guest_name: Some(guest_name),
            message,
        },
        Resolution::Rejected(reason) => CheckinResponse {
            outcome: "rejected",
            reason: Some(reason),
            guest_name: None,
            message,
        },
    };
    Ok(Json(response))
}
