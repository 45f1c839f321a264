//! # Soiree Check-In
//!
//! The guest identity and check-in subsystem: issuing a unique scannable
//! credential per guest at RSVP time, decoding that credential from a live
//! video source at the venue, resolving it against the guest registry, and
//! committing an attendance event exactly once per guest.
//!
//! ## Components
//!
//! - [`credential`] — derives opaque, collision-free admission tokens
//! - [`registry`] — persisted guest records and RSVP upserts
//! - [`ledger`] — the append-only attendance set with its "first scan wins"
//!   uniqueness guarantee
//! - [`resolver`] — token → guest → eligibility → ledger commit, in that
//!   order
//! - [`scanner`] — the cancellable frame decode loop, written as a reducer
//!   and driven by the `soiree-runtime` store
//! - [`notify`] — outbound RSVP notifications (never block the RSVP write)
//! - [`stores`] — in-memory providers plus, behind the `postgres` feature,
//!   sqlx-backed ones
//!
//! The camera and the QR symbol decoder are consumed as capabilities
//! ([`scanner::CameraPort`], [`scanner::SymbolDecoder`]); this crate contains
//! no camera driver and no decoding algorithm.

pub mod credential;
pub mod error;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod stores;

pub use credential::{CredentialIssuer, EventCredentialIssuer};
pub use error::{CheckinError, LedgerError, RegistryError, StoreFault};
pub use ledger::{AttendanceLedger, AttendanceStore, LedgerOutcome};
pub use model::{
    AttendanceId, AttendanceRecord, CheckedInGuest, Credential, Guest, GuestId, GuestStats,
    RsvpSubmission,
};
pub use registry::{GuestRegistry, GuestStore};
pub use resolver::{CheckInResolver, RejectReason, ResolvePort, Resolution};
