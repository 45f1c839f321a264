//! The attendance ledger: an append-only set of check-in events with a
//! uniqueness guarantee per guest.

use crate::error::{LedgerError, StoreFault};
use crate::model::{AttendanceId, AttendanceRecord, CheckedInGuest, GuestId};
use async_trait::async_trait;
use soiree_core::environment::Clock;
use std::sync::Arc;

/// Result of attempting to commit a check-in.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOutcome {
    /// This call won the slot; the record is now durable.
    Committed(AttendanceRecord),
    /// Another commit for the same guest already holds the slot.
    AlreadyPresent,
}

/// Persisted store boundary for attendance records.
///
/// `insert_if_absent` is the one concurrency-sensitive primitive in the
/// system: the store must make the duplicate check and the insert a single
/// atomic step (a uniqueness constraint with insert-or-reject, or an
/// equivalent conditional write). Concurrent calls for one guest yield
/// exactly one `Committed` — never two. A separate read followed by a write
/// is not an acceptable implementation.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Atomically insert `record` unless a record for its guest exists.
    async fn insert_if_absent(
        &self,
        record: AttendanceRecord,
    ) -> Result<LedgerOutcome, StoreFault>;

    /// All records joined with their guests, newest scan first.
    async fn list_with_guests(&self) -> Result<Vec<CheckedInGuest>, StoreFault>;
}

/// Check-in bookkeeping over an [`AttendanceStore`].
pub struct AttendanceLedger {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
}

impl AttendanceLedger {
    /// Create a ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Commit a check-in for `guest_id` unless one already exists.
    ///
    /// `station` labels the operator device that performed the scan.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Store`] if the store fails; the caller decides
    /// whether to retry, and a retry re-runs the whole resolution sequence.
    #[tracing::instrument(skip(self))]
    pub async fn record_if_absent(
        &self,
        guest_id: GuestId,
        station: &str,
    ) -> Result<LedgerOutcome, LedgerError> {
        let record = AttendanceRecord {
            id: AttendanceId::new(),
            guest_id,
            scanned_at: self.clock.now(),
            scanned_by: station.to_string(),
        };

        let outcome = self.store.insert_if_absent(record).await?;
        match &outcome {
            LedgerOutcome::Committed(record) => {
                metrics::counter!("ledger.checkin", "outcome" => "committed").increment(1);
                tracing::info!(guest_id = %record.guest_id, "Attendance committed");
            },
            LedgerOutcome::AlreadyPresent => {
                metrics::counter!("ledger.checkin", "outcome" => "duplicate").increment(1);
                tracing::info!(%guest_id, "Duplicate check-in attempt");
            },
        }
        Ok(outcome)
    }

    /// All check-ins joined with their guests, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Store`] if the store fails.
    pub async fn list(&self) -> Result<Vec<CheckedInGuest>, LedgerError> {
        Ok(self.store.list_with_guests().await?)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::credential::EventCredentialIssuer;
    use crate::model::{Guest, RsvpSubmission};
    use crate::registry::GuestRegistry;
    use crate::stores::memory::{MemoryAttendanceStore, MemoryGuestStore};
    use soiree_testing::test_clock;

    async fn fixture() -> (AttendanceLedger, Guest) {
        let clock = Arc::new(test_clock());
        let guests = Arc::new(MemoryGuestStore::new());
        let registry = GuestRegistry::new(
            guests.clone(),
            Arc::new(EventCredentialIssuer::new("EVT", clock.clone())),
            clock.clone(),
        );
        let guest = registry
            .upsert_by_name(RsvpSubmission {
                name: "Jane Doe".into(),
                email: None,
                phone: None,
                attending: true,
                message: None,
            })
            .await
            .unwrap();

        let ledger = AttendanceLedger::new(
            Arc::new(MemoryAttendanceStore::new(guests)),
            clock,
        );
        (ledger, guest)
    }

    #[tokio::test]
    async fn first_commit_wins_second_is_duplicate() {
        let (ledger, guest) = fixture().await;

        let first = ledger.record_if_absent(guest.id, "door-a").await.unwrap();
        assert!(matches!(first, LedgerOutcome::Committed(_)));

        let second = ledger.record_if_absent(guest.id, "door-b").await.unwrap();
        assert_eq!(second, LedgerOutcome::AlreadyPresent);

        assert_eq!(ledger.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_joins_guest_rows() {
        let (ledger, guest) = fixture().await;
        ledger.record_if_absent(guest.id, "door-a").await.unwrap();

        let entries = ledger.list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].guest.name, "Jane Doe");
        assert_eq!(entries[0].record.scanned_by, "door-a");
    }
}
