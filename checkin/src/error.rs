//! Error taxonomy for the check-in core.
//!
//! Three families, kept deliberately apart:
//!
//! - validation errors are synchronous caller mistakes and never leave
//!   partial state behind
//! - store faults are transient infrastructure failures; the core never
//!   retries them itself, because a blind retry around a non-atomic sequence
//!   could reintroduce the double-check-in race — callers retry by re-running
//!   the whole operation
//! - rejection outcomes (`resolver::Resolution`) are *not* errors at all;
//!   they are first-class results

use thiserror::Error;

/// A failure reported by the persisted store boundary.
#[derive(Debug, Clone, Error)]
pub enum StoreFault {
    /// Transient I/O failure talking to the store.
    #[error("storage I/O failure: {0}")]
    Io(String),

    /// A constraint the store enforces was violated.
    #[error("storage constraint violation: {0}")]
    Conflict(String),

    /// Stored data could not be decoded into a domain value.
    #[error("stored data could not be decoded: {0}")]
    Serialization(String),
}

/// Errors from guest registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The request was malformed (e.g. an empty guest name).
    #[error("{0}")]
    Validation(String),

    /// Admin pre-registration for a name that already has a guest row;
    /// one person must never hold two credentials.
    #[error("a guest named {name:?} is already registered")]
    AlreadyRegistered {
        /// The conflicting guest name.
        name: String,
    },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreFault),
}

/// Errors from attendance ledger operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreFault),
}

/// Errors from the check-in resolution sequence.
///
/// Rejections (unknown token, declined guest, duplicate scan) are not here —
/// they are [`crate::resolver::Resolution`] outcomes. This type only carries
/// infrastructure failures, after which a retry must re-run the full
/// resolution from the credential lookup.
#[derive(Debug, Clone, Error)]
pub enum CheckinError {
    /// The registry failed while looking up the guest.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The ledger failed while committing attendance.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_faults_propagate_transparently() {
        let fault = StoreFault::Io("connection reset".into());
        let err = RegistryError::from(fault);
        assert_eq!(err.to_string(), "storage I/O failure: connection reset");

        let err = CheckinError::from(err);
        assert_eq!(err.to_string(), "storage I/O failure: connection reset");
    }

    #[test]
    fn duplicate_registration_names_the_guest() {
        let err = RegistryError::AlreadyRegistered {
            name: "Jane Doe".into(),
        };
        assert!(err.to_string().contains("Jane Doe"));
    }
}
