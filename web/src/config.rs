//! Configuration, loaded from environment variables with defaults.

use chrono::{DateTime, Utc};
use std::env;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// PostgreSQL connection URL. Absent means the site runs on in-memory
    /// stores (fine for a single process, gone on restart).
    pub database_url: Option<String>,
    /// The shared admin secret gating registry and ledger views.
    pub admin_secret: String,
    /// Event code stamped into issued credentials.
    pub event_code: String,
    /// Station label recorded on check-ins committed through the API.
    pub station: String,
    /// RSVPs after this instant are refused. Absent means no deadline.
    pub rsvp_deadline: Option<DateTime<Utc>>,
    /// Outbound notification settings.
    pub notify: NotifyConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

/// Outbound notification settings.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Resend API key; absent falls back to console notifications.
    pub resend_api_key: Option<String>,
    /// Sender mailbox.
    pub sender: String,
    /// Recipient mailboxes.
    pub recipients: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("SOIREE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SOIREE_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
            },
            database_url: env::var("DATABASE_URL").ok(),
            admin_secret: env::var("SOIREE_ADMIN_SECRET")
                .unwrap_or_else(|_| "changeme".to_string()),
            event_code: env::var("SOIREE_EVENT_CODE").unwrap_or_else(|_| "EVT".to_string()),
            station: env::var("SOIREE_STATION").unwrap_or_else(|_| "admin".to_string()),
            rsvp_deadline: env::var("SOIREE_RSVP_DEADLINE")
                .ok()
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            notify: NotifyConfig {
                resend_api_key: env::var("RESEND_API_KEY").ok(),
                sender: env::var("SOIREE_NOTIFY_FROM")
                    .unwrap_or_else(|_| "Soiree RSVP <rsvp@example.com>".to_string()),
                recipients: env::var("SOIREE_NOTIFY_TO")
                    .map(|s| {
                        s.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        }
    }

    /// A localhost configuration for tests: in-memory stores, known secret,
    /// no deadline, console notifications.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database_url: None,
            admin_secret: "test-secret".to_string(),
            event_code: "EVT".to_string(),
            station: "admin".to_string(),
            rsvp_deadline: None,
            notify: NotifyConfig {
                resend_api_key: None,
                sender: "Soiree RSVP <rsvp@example.com>".to_string(),
                recipients: Vec::new(),
            },
        }
    }
}
