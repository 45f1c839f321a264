//! Self-service RSVP endpoint.

use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use soiree_checkin::model::{Credential, GuestId, RsvpSubmission};
use soiree_core::environment::Clock as _;

/// RSVP form submission.
#[derive(Debug, Deserialize)]
pub struct RsvpRequest {
    /// Guest name.
    pub name: String,
    /// Whether the guest can attend.
    pub attending: bool,
    /// Optional contact email.
    pub email: Option<String>,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Optional message to the host.
    pub message: Option<String>,
}

/// RSVP result, including the credential for QR rendering on the
/// confirmation screen.
#[derive(Debug, Serialize)]
pub struct RsvpResponse {
    /// The guest's registry id.
    pub guest_id: GuestId,
    /// The guest's name as stored.
    pub name: String,
    /// Recorded attendance intent.
    pub attending: bool,
    /// The guest's admission credential (QR payload).
    pub credential: Credential,
}

/// `POST /api/rsvp` — record a response and hand back the credential.
///
/// The outbound notification is fired on a detached task: delivery failures
/// are logged and never block or roll back the RSVP write.
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<RsvpRequest>,
) -> Result<Json<RsvpResponse>, ApiError> {
    if let Some(deadline) = state.config.rsvp_deadline {
        if state.clock.now() > deadline {
            return Err(ApiError::bad_request("The RSVP deadline has passed"));
        }
    }

    let guest = state
        .registry
        .upsert_by_name(RsvpSubmission {
            name: request.name,
            email: request.email,
            phone: request.phone,
            attending: request.attending,
            message: request.message,
        })
        .await?;

    let notifier = state.notifier.clone();
    let notified = guest.clone();
    tokio::spawn(async move {
        if let Err(err) = notifier.rsvp_received(&notified).await {
            tracing::warn!(guest = %notified.name, %err, "RSVP notification failed");
        }
    });

    Ok(Json(RsvpResponse {
        guest_id: guest.id,
        name: guest.name,
        attending: guest.is_attending == Some(true),
        credential: guest.credential,
    }))
}
