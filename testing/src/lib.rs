//! # Soiree Testing
//!
//! Testing utilities for soiree features:
//!
//! - deterministic environment doubles ([`mocks::FixedClock`])
//! - the [`ReducerTest`] Given-When-Then harness for exercising reducers
//!   without a runtime
//!
//! Scanner-specific doubles (scripted cameras and decoders) live next to the
//! scanner feature in `soiree-checkin`; this crate holds only what every
//! feature shares.

pub mod reducer_test;

/// Deterministic implementations of environment traits.
pub mod mocks {
    use chrono::{DateTime, Utc};
    use soiree_core::environment::Clock;

    /// Fixed clock for deterministic tests: always returns the same instant.
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a fixed clock pinned to `time`.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// A fixed clock pinned to 2026-01-01T00:00:00Z.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse, which cannot happen.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

pub use mocks::{FixedClock, test_clock};
pub use reducer_test::ReducerTest;
