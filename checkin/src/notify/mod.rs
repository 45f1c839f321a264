//! Outbound RSVP notifications.
//!
//! A boundary, not a feature: whatever happens here must never block or roll
//! back the RSVP write. Callers fire notifications on a detached task and log
//! failures.

pub mod console;
pub mod resend;

use crate::model::Guest;
use async_trait::async_trait;
use thiserror::Error;

pub use console::ConsoleNotifier;
pub use resend::ResendNotifier;

/// Notification delivery failures.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    /// The transport could not be reached.
    #[error("notification transport failed: {0}")]
    Transport(String),

    /// The provider refused the message.
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Delivers a human-readable notification about a guest's RSVP outcome.
#[async_trait]
pub trait RsvpNotifier: Send + Sync {
    /// Notify the host that `guest` responded.
    async fn rsvp_received(&self, guest: &Guest) -> Result<(), NotifyError>;
}

/// Subject line for an RSVP notification.
#[must_use]
pub fn subject(guest: &Guest) -> String {
    let response = if guest.is_confirmed_attending() {
        "Attending"
    } else {
        "Not attending"
    };
    format!("New RSVP: {} - {}", guest.name, response)
}

/// Plain-text body for an RSVP notification.
#[must_use]
pub fn body(guest: &Guest) -> String {
    let response = if guest.is_confirmed_attending() {
        "Can attend"
    } else {
        "Cannot attend"
    };
    let message = guest.message.as_deref().unwrap_or("No message");
    format!(
        "New RSVP received\n\n\
         Guest name: {}\n\
         Response: {}\n\
         Message: {}\n\
         Submitted at: {}\n",
        guest.name,
        response,
        message,
        guest.updated_at.to_rfc3339(),
    )
}
