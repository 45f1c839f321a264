//! Domain model for guests and attendance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a guest, assigned by the registry on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuestId(Uuid);

impl GuestId {
    /// Generate a fresh guest id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GuestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an attendance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttendanceId(Uuid);

impl AttendanceId {
    /// Generate a fresh attendance id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttendanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttendanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque admission token issued to a guest, encoded into a scannable symbol.
///
/// Unique across all guests, assigned once and never reassigned. Guests never
/// need to read it; the venue scanner does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// The token as a printable string (QR payload).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A guest row in the registry.
///
/// Invariants:
///
/// - exactly one `credential` per guest, immutable after first assignment
/// - `has_responded == true` implies `is_attending` is `Some`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    /// Registry-assigned identifier.
    pub id: GuestId,
    /// Display name; natural key for case-insensitive existence checks.
    pub name: String,
    /// Optional contact email.
    pub email: Option<String>,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Tri-state attendance intent: `None` until a response is recorded.
    pub is_attending: Option<bool>,
    /// True once any RSVP has been recorded for this guest.
    pub has_responded: bool,
    /// Free-text message left with the RSVP.
    pub message: Option<String>,
    /// The admission credential.
    pub credential: Credential,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    /// Whether this guest has confirmed they are attending.
    ///
    /// A declined guest and a guest who never responded are both ineligible
    /// for check-in, even with a syntactically valid credential.
    #[must_use]
    pub fn is_confirmed_attending(&self) -> bool {
        self.is_attending == Some(true)
    }
}

/// One committed check-in event.
///
/// References exactly one guest; the ledger does not own the guest row. At
/// most one record exists per distinct `guest_id` — the core correctness
/// property of the subsystem. Records are never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Ledger-assigned identifier.
    pub id: AttendanceId,
    /// The admitted guest.
    pub guest_id: GuestId,
    /// When the commit happened.
    pub scanned_at: DateTime<Utc>,
    /// Label of the operator station that committed the scan.
    pub scanned_by: String,
}

/// An attendance record joined with its guest, for operator views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckedInGuest {
    /// The attendance record.
    pub record: AttendanceRecord,
    /// The referenced guest.
    pub guest: Guest,
}

/// Aggregate guest-list counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuestStats {
    /// Number of guests on the list.
    pub total: usize,
    /// Guests with any recorded response.
    pub responded: usize,
    /// Guests who confirmed attendance.
    pub attending: usize,
}

/// A self-service RSVP submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsvpSubmission {
    /// Guest name as typed into the form.
    pub name: String,
    /// Optional contact email.
    pub email: Option<String>,
    /// Optional contact phone.
    pub phone: Option<String>,
    /// Whether the guest can attend.
    pub attending: bool,
    /// Optional free-text message.
    pub message: Option<String>,
}
