//! Credential issuance.
//!
//! A credential is derived from the guest name, the current time, and a wide
//! random component, so two guests sharing a name still receive distinct
//! tokens and the value cannot be guessed by brute force — it doubles as the
//! admission key at the door. Issuance has no storage or network side
//! effects.

use crate::model::Credential;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use soiree_core::environment::Clock;
use std::sync::Arc;

/// Width of the random suffix. 13 alphanumerics ≈ 77 bits of entropy.
const NONCE_LEN: usize = 13;

/// Issues one admission credential per call.
pub trait CredentialIssuer: Send + Sync {
    /// Derive a fresh credential for `name`.
    ///
    /// Distinct calls never produce the same token, regardless of the name.
    fn issue(&self, name: &str) -> Credential;
}

/// Production issuer: `<event-code>-<base64url(name)>-<unix-millis>-<nonce>`.
///
/// The name component is base64url so names outside ASCII survive intact;
/// the millisecond timestamp gives a monotonically observable component; the
/// nonce carries the collision resistance.
pub struct EventCredentialIssuer {
    event_code: String,
    clock: Arc<dyn Clock>,
}

impl EventCredentialIssuer {
    /// Create an issuer stamping tokens with `event_code`.
    #[must_use]
    pub fn new(event_code: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            event_code: event_code.into(),
            clock,
        }
    }
}

impl CredentialIssuer for EventCredentialIssuer {
    fn issue(&self, name: &str) -> Credential {
        let encoded_name = URL_SAFE_NO_PAD.encode(name.trim().as_bytes());
        let millis = self.clock.now().timestamp_millis();
        let nonce: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();

        Credential::from(format!(
            "{}-{}-{}-{}",
            self.event_code, encoded_name, millis, nonce
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use soiree_testing::test_clock;

    fn issuer() -> EventCredentialIssuer {
        EventCredentialIssuer::new("EVT", Arc::new(test_clock()))
    }

    #[test]
    fn tokens_carry_the_event_code() {
        let token = issuer().issue("Jane Doe");
        assert!(token.as_str().starts_with("EVT-"));
    }

    #[test]
    fn same_name_same_instant_distinct_tokens() {
        // The clock is frozen, so only the nonce separates these.
        let issuer = issuer();
        let a = issuer.issue("Jane Doe");
        let b = issuer.issue("Jane Doe");
        assert_ne!(a, b);
    }

    #[test]
    fn non_ascii_names_produce_printable_tokens() {
        let token = issuer().issue("Zoë Müller");
        assert!(token.as_str().is_ascii());
    }

    proptest! {
        #[test]
        fn issuance_never_collides(name in ".{0,40}") {
            let issuer = issuer();
            let a = issuer.issue(&name);
            let b = issuer.issue(&name);
            prop_assert_ne!(a, b);
        }
    }
}
