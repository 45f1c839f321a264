//! The guest registry: persisted guest records and RSVP upserts.

use crate::credential::CredentialIssuer;
use crate::error::{RegistryError, StoreFault};
use crate::model::{Credential, Guest, GuestId, GuestStats, RsvpSubmission};
use async_trait::async_trait;
use soiree_core::environment::Clock;
use std::sync::Arc;

/// Persisted store boundary for guest rows.
///
/// The registry needs only point lookups (primary key, credential,
/// case-insensitive name), insert, update, and a creation-ordered listing.
/// Implementations report transient failures as [`StoreFault`]; the registry
/// never retries on its own — callers may, by re-invoking the operation.
#[async_trait]
pub trait GuestStore: Send + Sync {
    /// Point lookup by primary key.
    async fn find_by_id(&self, id: &GuestId) -> Result<Option<Guest>, StoreFault>;

    /// Case-insensitive exact-name lookup.
    async fn find_by_name_ci(&self, name: &str) -> Result<Option<Guest>, StoreFault>;

    /// Lookup by the unique credential field.
    async fn find_by_credential(&self, credential: &Credential)
    -> Result<Option<Guest>, StoreFault>;

    /// Insert a new guest row; duplicate credentials are a [`StoreFault::Conflict`].
    async fn insert(&self, guest: Guest) -> Result<(), StoreFault>;

    /// Replace an existing guest row.
    async fn update(&self, guest: Guest) -> Result<(), StoreFault>;

    /// All guests, newest creation first.
    async fn list_by_creation_desc(&self) -> Result<Vec<Guest>, StoreFault>;
}

/// Guest-list management over a [`GuestStore`].
pub struct GuestRegistry {
    store: Arc<dyn GuestStore>,
    issuer: Arc<dyn CredentialIssuer>,
    clock: Arc<dyn Clock>,
}

impl GuestRegistry {
    /// Create a registry over `store`, issuing credentials with `issuer`.
    #[must_use]
    pub fn new(
        store: Arc<dyn GuestStore>,
        issuer: Arc<dyn CredentialIssuer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            issuer,
            clock,
        }
    }

    /// Record a self-service RSVP.
    ///
    /// Looks the guest up by case-insensitive name. An existing guest is
    /// updated in place — attendance intent, contact fields, message,
    /// `updated_at` — and keeps their `id` and `credential` unchanged. An
    /// unknown name creates a new guest with a freshly issued credential and
    /// `has_responded = true`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Validation`] if the trimmed name is empty
    /// - [`RegistryError::Store`] if the store fails
    #[tracing::instrument(skip(self, submission), fields(guest = %submission.name))]
    pub async fn upsert_by_name(
        &self,
        submission: RsvpSubmission,
    ) -> Result<Guest, RegistryError> {
        let name = submission.name.trim();
        if name.is_empty() {
            return Err(RegistryError::Validation(
                "guest name must not be empty".into(),
            ));
        }

        let now = self.clock.now();
        match self.store.find_by_name_ci(name).await? {
            Some(mut guest) => {
                guest.is_attending = Some(submission.attending);
                guest.has_responded = true;
                guest.email = normalize(submission.email);
                guest.phone = normalize(submission.phone);
                guest.message = normalize(submission.message);
                guest.updated_at = now;
                self.store.update(guest.clone()).await?;

                metrics::counter!("registry.rsvp", "kind" => "updated").increment(1);
                tracing::info!(guest_id = %guest.id, attending = submission.attending, "RSVP updated");
                Ok(guest)
            },
            None => {
                let guest = Guest {
                    id: GuestId::new(),
                    name: name.to_string(),
                    email: normalize(submission.email),
                    phone: normalize(submission.phone),
                    is_attending: Some(submission.attending),
                    has_responded: true,
                    message: normalize(submission.message),
                    credential: self.issuer.issue(name),
                    created_at: now,
                    updated_at: now,
                };
                self.store.insert(guest.clone()).await?;

                metrics::counter!("registry.rsvp", "kind" => "created").increment(1);
                tracing::info!(guest_id = %guest.id, attending = submission.attending, "RSVP recorded");
                Ok(guest)
            },
        }
    }

    /// Pre-register a guest from the admin path.
    ///
    /// The credential is issued immediately even though the guest has not
    /// responded yet (`has_responded = false`, intent unknown).
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Validation`] if the trimmed name is empty
    /// - [`RegistryError::AlreadyRegistered`] if a guest with that name exists
    /// - [`RegistryError::Store`] if the store fails
    #[tracing::instrument(skip(self, email, phone))]
    pub async fn create_pending(
        &self,
        name: &str,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Guest, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::Validation(
                "guest name must not be empty".into(),
            ));
        }

        if self.store.find_by_name_ci(name).await?.is_some() {
            return Err(RegistryError::AlreadyRegistered {
                name: name.to_string(),
            });
        }

        let now = self.clock.now();
        let guest = Guest {
            id: GuestId::new(),
            name: name.to_string(),
            email: normalize(email),
            phone: normalize(phone),
            is_attending: None,
            has_responded: false,
            message: None,
            credential: self.issuer.issue(name),
            created_at: now,
            updated_at: now,
        };
        self.store.insert(guest.clone()).await?;

        metrics::counter!("registry.preregistered").increment(1);
        tracing::info!(guest_id = %guest.id, "Guest pre-registered");
        Ok(guest)
    }

    /// Look a guest up by their admission credential.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the store fails.
    pub async fn find_by_credential(
        &self,
        credential: &Credential,
    ) -> Result<Option<Guest>, RegistryError> {
        Ok(self.store.find_by_credential(credential).await?)
    }

    /// All guests, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the store fails.
    pub async fn list(&self) -> Result<Vec<Guest>, RegistryError> {
        Ok(self.store.list_by_creation_desc().await?)
    }

    /// Aggregate counters for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Store`] if the store fails.
    pub async fn stats(&self) -> Result<GuestStats, RegistryError> {
        let guests = self.store.list_by_creation_desc().await?;
        Ok(GuestStats {
            total: guests.len(),
            responded: guests.iter().filter(|g| g.has_responded).count(),
            attending: guests.iter().filter(|g| g.is_confirmed_attending()).count(),
        })
    }
}

/// Trim a free-form field; blank collapses to absent.
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
