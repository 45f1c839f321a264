//! The admin gate: a shared secret exchanged for a bearer session token.
//!
//! Deliberately not a credential system — no users, no hashing, one secret
//! from configuration compared against the submitted value, and an
//! in-process set of minted tokens. It is isolated behind this type so a
//! real authentication layer can replace it without touching the check-in
//! core.

use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Length of minted session tokens.
const TOKEN_LEN: usize = 32;

/// In-process admin session registry.
pub struct AdminSessions {
    secret: String,
    tokens: RwLock<HashSet<String>>,
}

impl AdminSessions {
    /// Create a gate guarding with `secret`.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tokens: RwLock::new(HashSet::new()),
        }
    }

    /// Exchange the shared secret for a session token.
    ///
    /// Returns `None` when the presented secret does not match.
    #[must_use]
    pub fn begin(&self, presented: &str) -> Option<String> {
        if self.secret.is_empty() || presented != self.secret {
            metrics::counter!("admin.session", "outcome" => "denied").increment(1);
            return None;
        }

        let token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone());

        metrics::counter!("admin.session", "outcome" => "issued").increment(1);
        Some(token)
    }

    /// Whether `token` names a live admin session.
    #[must_use]
    pub fn verify(&self, token: &str) -> bool {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(token)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;

    #[test]
    fn correct_secret_mints_a_verifiable_token() {
        let sessions = AdminSessions::new("hunter2");
        let token = sessions.begin("hunter2").unwrap();
        assert!(sessions.verify(&token));
    }

    #[test]
    fn wrong_secret_mints_nothing() {
        let sessions = AdminSessions::new("hunter2");
        assert!(sessions.begin("guess").is_none());
        assert!(!sessions.verify("guess"));
    }

    #[test]
    fn empty_secret_locks_the_gate_entirely() {
        let sessions = AdminSessions::new("");
        assert!(sessions.begin("").is_none());
    }
}
