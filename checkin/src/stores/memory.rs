//! In-memory store providers.
//!
//! Mutex-guarded maps. The attendance map doubles as the atomic
//! insert-or-reject primitive the ledger contract demands: occupancy check
//! and insert happen under one lock acquisition, so concurrent commits for
//! one guest can never both win.

use crate::error::StoreFault;
use crate::ledger::{AttendanceStore, LedgerOutcome};
use crate::model::{AttendanceRecord, CheckedInGuest, Credential, Guest, GuestId};
use crate::registry::GuestStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Guest row plus an insertion sequence for stable ordering when timestamps
/// tie (a frozen test clock produces identical `created_at` values).
#[derive(Clone)]
struct StoredGuest {
    guest: Guest,
    seq: u64,
}

/// In-memory [`GuestStore`].
#[derive(Default)]
pub struct MemoryGuestStore {
    rows: Mutex<HashMap<GuestId, StoredGuest>>,
    seq: AtomicU64,
}

impl MemoryGuestStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<GuestId, StoredGuest>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl GuestStore for MemoryGuestStore {
    async fn find_by_id(&self, id: &GuestId) -> Result<Option<Guest>, StoreFault> {
        Ok(self.lock().get(id).map(|row| row.guest.clone()))
    }

    async fn find_by_name_ci(&self, name: &str) -> Result<Option<Guest>, StoreFault> {
        let needle = name.to_lowercase();
        Ok(self
            .lock()
            .values()
            .find(|row| row.guest.name.to_lowercase() == needle)
            .map(|row| row.guest.clone()))
    }

    async fn find_by_credential(
        &self,
        credential: &Credential,
    ) -> Result<Option<Guest>, StoreFault> {
        Ok(self
            .lock()
            .values()
            .find(|row| row.guest.credential == *credential)
            .map(|row| row.guest.clone()))
    }

    async fn insert(&self, guest: Guest) -> Result<(), StoreFault> {
        let mut rows = self.lock();
        if rows.contains_key(&guest.id) {
            return Err(StoreFault::Conflict(format!(
                "guest {} already exists",
                guest.id
            )));
        }
        if rows
            .values()
            .any(|row| row.guest.credential == guest.credential)
        {
            return Err(StoreFault::Conflict("duplicate credential".into()));
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        rows.insert(guest.id, StoredGuest { guest, seq });
        Ok(())
    }

    async fn update(&self, guest: Guest) -> Result<(), StoreFault> {
        let mut rows = self.lock();
        match rows.get_mut(&guest.id) {
            Some(row) => {
                row.guest = guest;
                Ok(())
            },
            None => Err(StoreFault::Io(format!("no guest row for {}", guest.id))),
        }
    }

    async fn list_by_creation_desc(&self) -> Result<Vec<Guest>, StoreFault> {
        let mut rows: Vec<StoredGuest> = self.lock().values().cloned().collect();
        rows.sort_by(|a, b| {
            b.guest
                .created_at
                .cmp(&a.guest.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(rows.into_iter().map(|row| row.guest).collect())
    }
}

/// In-memory [`AttendanceStore`].
///
/// Holds a reference to the guest store to serve the joined listing, the way
/// the SQL provider joins on `guest_id`.
pub struct MemoryAttendanceStore {
    rows: Mutex<HashMap<GuestId, (AttendanceRecord, u64)>>,
    guests: std::sync::Arc<dyn GuestStore>,
    seq: AtomicU64,
}

impl MemoryAttendanceStore {
    /// Create an empty ledger store joining against `guests`.
    #[must_use]
    pub fn new(guests: std::sync::Arc<dyn GuestStore>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            guests,
            seq: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<GuestId, (AttendanceRecord, u64)>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn insert_if_absent(
        &self,
        record: AttendanceRecord,
    ) -> Result<LedgerOutcome, StoreFault> {
        let mut rows = self.lock();
        match rows.entry(record.guest_id) {
            Entry::Occupied(_) => Ok(LedgerOutcome::AlreadyPresent),
            Entry::Vacant(slot) => {
                let seq = self.seq.fetch_add(1, Ordering::Relaxed);
                slot.insert((record.clone(), seq));
                Ok(LedgerOutcome::Committed(record))
            },
        }
    }

    async fn list_with_guests(&self) -> Result<Vec<CheckedInGuest>, StoreFault> {
        let mut records: Vec<(AttendanceRecord, u64)> = self.lock().values().cloned().collect();
        records.sort_by(|a, b| b.0.scanned_at.cmp(&a.0.scanned_at).then(b.1.cmp(&a.1)));

        let mut entries = Vec::with_capacity(records.len());
        for (record, _) in records {
            match self.guests.find_by_id(&record.guest_id).await? {
                Some(guest) => entries.push(CheckedInGuest { record, guest }),
                None => {
                    tracing::warn!(guest_id = %record.guest_id, "Attendance record without guest row");
                },
            }
        }
        Ok(entries)
    }
}
