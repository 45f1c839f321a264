//! Application state shared across HTTP handlers.

use crate::config::Config;
use crate::sessions::AdminSessions;
use soiree_checkin::credential::EventCredentialIssuer;
use soiree_checkin::ledger::{AttendanceLedger, AttendanceStore};
use soiree_checkin::notify::{ConsoleNotifier, ResendNotifier, RsvpNotifier};
use soiree_checkin::registry::{GuestRegistry, GuestStore};
use soiree_checkin::resolver::CheckInResolver;
use soiree_checkin::stores::memory::{MemoryAttendanceStore, MemoryGuestStore};
use soiree_checkin::stores::postgres::{PostgresAttendanceStore, PostgresGuestStore};
use soiree_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Everything the handlers need, cheaply cloneable per request.
#[derive(Clone)]
pub struct AppState {
    /// Guest registry.
    pub registry: Arc<GuestRegistry>,
    /// Attendance ledger.
    pub ledger: Arc<AttendanceLedger>,
    /// Check-in resolver.
    pub resolver: Arc<CheckInResolver>,
    /// Admin session gate.
    pub sessions: Arc<AdminSessions>,
    /// RSVP notification provider.
    pub notifier: Arc<dyn RsvpNotifier>,
    /// Clock for deadline checks and export timestamps.
    pub clock: Arc<dyn Clock>,
    /// Loaded configuration.
    pub config: Arc<Config>,
}

impl AppState {
    /// Assemble state from already-built stores.
    #[must_use]
    pub fn assemble(
        config: Config,
        guests: Arc<dyn GuestStore>,
        attendance: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let issuer = Arc::new(EventCredentialIssuer::new(
            config.event_code.clone(),
            clock.clone(),
        ));
        let registry = Arc::new(GuestRegistry::new(guests, issuer, clock.clone()));
        let ledger = Arc::new(AttendanceLedger::new(attendance, clock.clone()));
        let resolver = Arc::new(CheckInResolver::new(
            registry.clone(),
            ledger.clone(),
            config.station.clone(),
        ));
        let sessions = Arc::new(AdminSessions::new(config.admin_secret.clone()));

        let notifier: Arc<dyn RsvpNotifier> = match (
            &config.notify.resend_api_key,
            config.notify.recipients.is_empty(),
        ) {
            (Some(key), false) => Arc::new(ResendNotifier::new(
                key.clone(),
                config.notify.sender.clone(),
                config.notify.recipients.clone(),
            )),
            _ => Arc::new(ConsoleNotifier::new()),
        };

        Self {
            registry,
            ledger,
            resolver,
            sessions,
            notifier,
            clock,
            config: Arc::new(config),
        }
    }

    /// Build state from configuration: PostgreSQL stores when a database URL
    /// is configured, in-memory stores otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached or the schema
    /// cannot be applied.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        match &config.database_url {
            Some(url) => {
                let pool = Arc::new(sqlx::PgPool::connect(url).await?);
                sqlx::raw_sql(include_str!("../../checkin/migrations/0001_schema.sql"))
                    .execute(pool.as_ref())
                    .await?;
                tracing::info!("Connected to PostgreSQL");

                let guests = Arc::new(PostgresGuestStore::new(pool.clone()));
                let attendance = Arc::new(PostgresAttendanceStore::new(pool));
                Ok(Self::assemble(config, guests, attendance, clock))
            },
            None => {
                tracing::warn!("No DATABASE_URL configured; using in-memory stores");
                let guests = Arc::new(MemoryGuestStore::new());
                let attendance = Arc::new(MemoryAttendanceStore::new(guests.clone()));
                Ok(Self::assemble(config, guests, attendance, clock))
            },
        }
    }

    /// In-memory state for tests, with a caller-supplied clock.
    #[must_use]
    pub fn for_testing(config: Config, clock: Arc<dyn Clock>) -> Self {
        let guests = Arc::new(MemoryGuestStore::new());
        let attendance = Arc::new(MemoryAttendanceStore::new(guests.clone()));
        Self::assemble(config, guests, attendance, clock)
    }
}
