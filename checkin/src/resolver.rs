//! The check-in resolver: token → guest → eligibility → ledger commit.

use crate::error::CheckinError;
use crate::ledger::{AttendanceLedger, LedgerOutcome};
use crate::model::Credential;
use crate::registry::GuestRegistry;
use async_trait::async_trait;
use std::sync::Arc;

/// Why a scan was turned away.
///
/// Each reason maps to a distinct operator-facing message, because venue
/// staff act differently on each: redirect a declined guest, wave through a
/// duplicate, double-check an unknown code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The token was never issued to any guest.
    NotFound,
    /// The guest declined, or never confirmed attendance.
    NotAttending,
    /// The guest has already been admitted.
    AlreadyCheckedIn,
}

impl RejectReason {
    /// Operator-facing message for this rejection.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotFound => "This code is not on the guest list.",
            Self::NotAttending => "This guest declined or has not confirmed attendance.",
            Self::AlreadyCheckedIn => "This guest has already been checked in.",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::NotAttending => "not_attending",
            Self::AlreadyCheckedIn => "already_checked_in",
        }
    }
}

/// Outcome of resolving one scanned token.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Resolution {
    /// The guest is admitted; greet them by name.
    Welcomed {
        /// Display name of the admitted guest.
        guest_name: String,
    },
    /// The scan was turned away.
    Rejected(RejectReason),
}

impl Resolution {
    /// Operator-facing message for this outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Welcomed { guest_name } => format!("Welcome, {guest_name}!"),
            Self::Rejected(reason) => reason.message().to_string(),
        }
    }
}

/// Capability boundary the scan loop uses to resolve decoded payloads.
#[async_trait]
pub trait ResolvePort: Send + Sync {
    /// Resolve a scanned token into an admission outcome.
    async fn resolve(&self, token: &Credential) -> Result<Resolution, CheckinError>;
}

/// Orchestrates the resolution sequence against registry and ledger.
pub struct CheckInResolver {
    registry: Arc<GuestRegistry>,
    ledger: Arc<AttendanceLedger>,
    station: String,
}

impl CheckInResolver {
    /// Create a resolver committing scans under the `station` label.
    #[must_use]
    pub fn new(
        registry: Arc<GuestRegistry>,
        ledger: Arc<AttendanceLedger>,
        station: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            ledger,
            station: station.into(),
        }
    }
}

#[async_trait]
impl ResolvePort for CheckInResolver {
    /// The step order here is a correctness contract, not a convenience:
    /// eligibility is checked before the ledger commit so a declining guest's
    /// credential never occupies a ledger slot, and the commit comes last so
    /// a concurrent duplicate scan cannot slip in between — the ledger's
    /// atomic insert decides the winner. Nothing is cached between steps;
    /// a retry after a store fault re-enters at the lookup.
    #[tracing::instrument(skip(self, token))]
    async fn resolve(&self, token: &Credential) -> Result<Resolution, CheckinError> {
        let Some(guest) = self.registry.find_by_credential(token).await? else {
            metrics::counter!("checkin.resolved", "outcome" => RejectReason::NotFound.label())
                .increment(1);
            return Ok(Resolution::Rejected(RejectReason::NotFound));
        };

        if !guest.is_confirmed_attending() {
            metrics::counter!("checkin.resolved", "outcome" => RejectReason::NotAttending.label())
                .increment(1);
            return Ok(Resolution::Rejected(RejectReason::NotAttending));
        }

        match self
            .ledger
            .record_if_absent(guest.id, &self.station)
            .await?
        {
            LedgerOutcome::Committed(_) => {
                metrics::counter!("checkin.resolved", "outcome" => "welcomed").increment(1);
                Ok(Resolution::Welcomed {
                    guest_name: guest.name,
                })
            },
            LedgerOutcome::AlreadyPresent => {
                metrics::counter!(
                    "checkin.resolved",
                    "outcome" => RejectReason::AlreadyCheckedIn.label()
                )
                .increment(1);
                Ok(Resolution::Rejected(RejectReason::AlreadyCheckedIn))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::credential::EventCredentialIssuer;
    use crate::model::RsvpSubmission;
    use crate::stores::memory::{MemoryAttendanceStore, MemoryGuestStore};
    use soiree_testing::test_clock;

    struct Fixture {
        registry: Arc<GuestRegistry>,
        ledger: Arc<AttendanceLedger>,
        resolver: CheckInResolver,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(test_clock());
        let guests = Arc::new(MemoryGuestStore::new());
        let registry = Arc::new(GuestRegistry::new(
            guests.clone(),
            Arc::new(EventCredentialIssuer::new("EVT", clock.clone())),
            clock.clone(),
        ));
        let ledger = Arc::new(AttendanceLedger::new(
            Arc::new(MemoryAttendanceStore::new(guests)),
            clock,
        ));
        let resolver = CheckInResolver::new(registry.clone(), ledger.clone(), "admin");
        Fixture {
            registry,
            ledger,
            resolver,
        }
    }

    fn rsvp(name: &str, attending: bool) -> RsvpSubmission {
        RsvpSubmission {
            name: name.into(),
            email: None,
            phone: None,
            attending,
            message: None,
        }
    }

    #[tokio::test]
    async fn unknown_token_is_not_found_not_an_error() {
        let f = fixture();
        let outcome = f
            .resolver
            .resolve(&Credential::from("never-issued"))
            .await
            .unwrap();
        assert_eq!(outcome, Resolution::Rejected(RejectReason::NotFound));
    }

    #[tokio::test]
    async fn attending_guest_is_welcomed_once() {
        let f = fixture();
        let guest = f.registry.upsert_by_name(rsvp("Jane Doe", true)).await.unwrap();

        let first = f.resolver.resolve(&guest.credential).await.unwrap();
        assert_eq!(
            first,
            Resolution::Welcomed {
                guest_name: "Jane Doe".into()
            }
        );

        let second = f.resolver.resolve(&guest.credential).await.unwrap();
        assert_eq!(second, Resolution::Rejected(RejectReason::AlreadyCheckedIn));

        assert_eq!(f.ledger.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn declined_guest_never_occupies_a_ledger_slot() {
        let f = fixture();
        let guest = f.registry.upsert_by_name(rsvp("John Smith", false)).await.unwrap();

        let outcome = f.resolver.resolve(&guest.credential).await.unwrap();
        assert_eq!(outcome, Resolution::Rejected(RejectReason::NotAttending));
        assert!(f.ledger.list().await.unwrap().is_empty());

        // Even repeated scans leave the ledger untouched.
        let outcome = f.resolver.resolve(&guest.credential).await.unwrap();
        assert_eq!(outcome, Resolution::Rejected(RejectReason::NotAttending));
        assert!(f.ledger.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unresponded_guest_is_rejected_despite_a_valid_credential() {
        let f = fixture();
        let guest = f
            .registry
            .create_pending("Silent Guest", None, None)
            .await
            .unwrap();

        let outcome = f.resolver.resolve(&guest.credential).await.unwrap();
        assert_eq!(outcome, Resolution::Rejected(RejectReason::NotAttending));
        assert!(f.ledger.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn distinct_messages_per_reason() {
        let messages = [
            RejectReason::NotFound.message(),
            RejectReason::NotAttending.message(),
            RejectReason::AlreadyCheckedIn.message(),
        ];
        assert_eq!(
            messages.len(),
            messages.iter().collect::<std::collections::HashSet<_>>().len()
        );
    }
}
