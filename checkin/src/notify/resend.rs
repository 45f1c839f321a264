//! Resend email provider for RSVP notifications.

use super::{NotifyError, RsvpNotifier, body, subject};
use crate::model::Guest;
use async_trait::async_trait;
use serde_json::json;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Sends RSVP notifications through the Resend HTTP API.
pub struct ResendNotifier {
    client: reqwest::Client,
    api_key: String,
    from: String,
    to: Vec<String>,
}

impl ResendNotifier {
    /// Create a notifier posting as `from` to the `to` recipients.
    #[must_use]
    pub fn new(api_key: impl Into<String>, from: impl Into<String>, to: Vec<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            to,
        }
    }
}

#[async_trait]
impl RsvpNotifier for ResendNotifier {
    async fn rsvp_received(&self, guest: &Guest) -> Result<(), NotifyError> {
        let payload = json!({
            "from": self.from,
            "to": self.to,
            "subject": subject(guest),
            "text": body(guest),
        });

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if response.status().is_success() {
            tracing::debug!(guest = %guest.name, "RSVP notification delivered");
            Ok(())
        } else {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected(format!("{status}: {detail}")))
        }
    }
}
