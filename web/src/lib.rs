//! # Soiree Web
//!
//! The invitation site's HTTP surface: self-service RSVP, the admin guest
//! list with pre-registration and CSV export, attendance views, and the
//! check-in endpoint operators post scanned tokens to.
//!
//! The shell is thin on purpose — request parsing, the admin gate, and
//! response mapping live here; every correctness-bearing rule lives in
//! `soiree-checkin` where it is testable without HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod routes;
pub mod sessions;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use routes::build_router;
pub use sessions::AdminSessions;
pub use state::AppState;
