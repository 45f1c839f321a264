//! Console notification provider for development and single-host setups.

use super::{NotifyError, RsvpNotifier, body, subject};
use crate::model::Guest;
use async_trait::async_trait;

/// Logs notifications instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// Create a console notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RsvpNotifier for ConsoleNotifier {
    async fn rsvp_received(&self, guest: &Guest) -> Result<(), NotifyError> {
        tracing::info!(
            subject = %subject(guest),
            body = %body(guest),
            "RSVP notification (console mode)"
        );
        Ok(())
    }
}
