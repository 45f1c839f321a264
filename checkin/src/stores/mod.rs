//! Store providers for the registry and ledger.
//!
//! `memory` is always available: it backs tests and single-process
//! deployments with no database configured. `postgres` (behind the feature of
//! the same name) maps the same traits onto sqlx.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::{MemoryAttendanceStore, MemoryGuestStore};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresAttendanceStore, PostgresGuestStore};
