//! PostgreSQL store providers (feature `postgres`).
//!
//! Schema lives in `migrations/0001_schema.sql`: a `guests` table with a
//! unique credential column and an `attendance` table with a unique
//! `guest_id` foreign key. The ledger's insert-or-reject primitive is
//! `INSERT ... ON CONFLICT (guest_id) DO NOTHING` — the database enforces
//! "first scan wins", so no client-side locking is needed anywhere.

use crate::error::StoreFault;
use crate::ledger::{AttendanceStore, LedgerOutcome};
use crate::model::{
    AttendanceId, AttendanceRecord, CheckedInGuest, Credential, Guest, GuestId,
};
use crate::registry::GuestStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Map a sqlx error onto the store fault taxonomy.
fn fault(err: sqlx::Error) -> StoreFault {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreFault::Conflict(db.message().to_string());
        }
    }
    StoreFault::Io(err.to_string())
}

#[derive(sqlx::FromRow)]
struct GuestRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    is_attending: Option<bool>,
    has_responded: bool,
    message: Option<String>,
    credential: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<GuestRow> for Guest {
    fn from(row: GuestRow) -> Self {
        Self {
            id: GuestId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            is_attending: row.is_attending,
            has_responded: row.has_responded,
            message: row.message,
            credential: Credential::from(row.credential),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const GUEST_COLUMNS: &str = "id, name, email, phone, is_attending, has_responded, message, \
                             credential, created_at, updated_at";

/// PostgreSQL-backed [`GuestStore`].
#[derive(Clone)]
pub struct PostgresGuestStore {
    pool: Arc<PgPool>,
}

impl PostgresGuestStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuestStore for PostgresGuestStore {
    async fn find_by_id(&self, id: &GuestId) -> Result<Option<Guest>, StoreFault> {
        let row: Option<GuestRow> = sqlx::query_as(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(fault)?;
        Ok(row.map(Guest::from))
    }

    async fn find_by_name_ci(&self, name: &str) -> Result<Option<Guest>, StoreFault> {
        let row: Option<GuestRow> = sqlx::query_as(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE lower(name) = lower($1) LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(fault)?;
        Ok(row.map(Guest::from))
    }

    async fn find_by_credential(
        &self,
        credential: &Credential,
    ) -> Result<Option<Guest>, StoreFault> {
        let row: Option<GuestRow> = sqlx::query_as(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests WHERE credential = $1"
        ))
        .bind(credential.as_str())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(fault)?;
        Ok(row.map(Guest::from))
    }

    async fn insert(&self, guest: Guest) -> Result<(), StoreFault> {
        sqlx::query(
            "INSERT INTO guests \
             (id, name, email, phone, is_attending, has_responded, message, credential, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(guest.id.as_uuid())
        .bind(&guest.name)
        .bind(&guest.email)
        .bind(&guest.phone)
        .bind(guest.is_attending)
        .bind(guest.has_responded)
        .bind(&guest.message)
        .bind(guest.credential.as_str())
        .bind(guest.created_at)
        .bind(guest.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(fault)?;
        Ok(())
    }

    async fn update(&self, guest: Guest) -> Result<(), StoreFault> {
        let result = sqlx::query(
            "UPDATE guests SET \
             email = $2, phone = $3, is_attending = $4, has_responded = $5, message = $6, \
             updated_at = $7 \
             WHERE id = $1",
        )
        .bind(guest.id.as_uuid())
        .bind(&guest.email)
        .bind(&guest.phone)
        .bind(guest.is_attending)
        .bind(guest.has_responded)
        .bind(&guest.message)
        .bind(guest.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(fault)?;

        if result.rows_affected() == 0 {
            return Err(StoreFault::Io(format!("no guest row for {}", guest.id)));
        }
        Ok(())
    }

    async fn list_by_creation_desc(&self) -> Result<Vec<Guest>, StoreFault> {
        let rows: Vec<GuestRow> = sqlx::query_as(&format!(
            "SELECT {GUEST_COLUMNS} FROM guests ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(fault)?;
        Ok(rows.into_iter().map(Guest::from).collect())
    }
}

#[derive(sqlx::FromRow)]
struct CheckedInRow {
    attendance_id: Uuid,
    scanned_at: DateTime<Utc>,
    scanned_by: String,
    id: Uuid,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    is_attending: Option<bool>,
    has_responded: bool,
    message: Option<String>,
    credential: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CheckedInRow> for CheckedInGuest {
    fn from(row: CheckedInRow) -> Self {
        Self {
            record: AttendanceRecord {
                id: AttendanceId::from_uuid(row.attendance_id),
                guest_id: GuestId::from_uuid(row.id),
                scanned_at: row.scanned_at,
                scanned_by: row.scanned_by.clone(),
            },
            guest: Guest {
                id: GuestId::from_uuid(row.id),
                name: row.name,
                email: row.email,
                phone: row.phone,
                is_attending: row.is_attending,
                has_responded: row.has_responded,
                message: row.message,
                credential: Credential::from(row.credential),
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

/// PostgreSQL-backed [`AttendanceStore`].
#[derive(Clone)]
pub struct PostgresAttendanceStore {
    pool: Arc<PgPool>,
}

impl PostgresAttendanceStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for PostgresAttendanceStore {
    async fn insert_if_absent(
        &self,
        record: AttendanceRecord,
    ) -> Result<LedgerOutcome, StoreFault> {
        let result = sqlx::query(
            "INSERT INTO attendance (id, guest_id, scanned_at, scanned_by) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (guest_id) DO NOTHING",
        )
        .bind(record.id.as_uuid())
        .bind(record.guest_id.as_uuid())
        .bind(record.scanned_at)
        .bind(&record.scanned_by)
        .execute(self.pool.as_ref())
        .await
        .map_err(fault)?;

        if result.rows_affected() == 0 {
            Ok(LedgerOutcome::AlreadyPresent)
        } else {
            Ok(LedgerOutcome::Committed(record))
        }
    }

    async fn list_with_guests(&self) -> Result<Vec<CheckedInGuest>, StoreFault> {
        let rows: Vec<CheckedInRow> = sqlx::query_as(
            "SELECT a.id AS attendance_id, a.scanned_at, a.scanned_by, \
                    g.id, g.name, g.email, g.phone, g.is_attending, g.has_responded, \
                    g.message, g.credential, g.created_at, g.updated_at \
             FROM attendance a \
             JOIN guests g ON g.id = a.guest_id \
             ORDER BY a.scanned_at DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(fault)?;
        Ok(rows.into_iter().map(CheckedInGuest::from).collect())
    }
}
