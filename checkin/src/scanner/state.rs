//! Scanner state machine types.

use crate::model::Credential;
use crate::resolver::{RejectReason, Resolution};
use crate::scanner::capture::CaptureFailure;

/// Phase of the decode loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanPhase {
    /// No camera capability held.
    Idle,
    /// Acquiring the video source.
    Requesting,
    /// Sampling frames, one decode attempt per tick.
    Active,
    /// A payload was decoded; its resolution is outstanding. No sampling
    /// happens in this phase — a second decode while one resolution is
    /// pending is discarded.
    Resolving {
        /// The token being resolved.
        token: Credential,
    },
    /// A resolution outcome is being shown to the operator.
    Presenting,
    /// Camera acquisition failed with a classified cause. Restart is an
    /// explicit operator action, never automatic.
    Failed(CaptureFailure),
    /// Externally stopped; all capture resources released.
    Stopped,
}

/// Outcome of resolving one decoded payload, as shown to the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The guest is admitted.
    Welcomed {
        /// Display name of the admitted guest.
        guest_name: String,
    },
    /// The scan was turned away.
    Rejected(RejectReason),
    /// The store failed mid-resolution; a retry re-runs the full sequence.
    Faulted {
        /// Human-readable failure description.
        detail: String,
    },
}

impl ScanOutcome {
    /// Operator-facing message for this outcome.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Welcomed { guest_name } => format!("Welcome, {guest_name}!"),
            Self::Rejected(reason) => reason.message().to_string(),
            Self::Faulted { detail } => format!("Check-in is unavailable: {detail}"),
        }
    }
}

impl From<Resolution> for ScanOutcome {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Welcomed { guest_name } => Self::Welcomed { guest_name },
            Resolution::Rejected(reason) => Self::Rejected(reason),
        }
    }
}

/// State for the scanner reducer.
#[derive(Debug, Clone)]
pub struct ScannerState {
    /// Current loop phase.
    pub phase: ScanPhase,
    /// Session generation. Bumped on every `Start`; scheduled ticks carry the
    /// generation they were scheduled under, and ticks from an older
    /// generation are inert even if a cancelled handle managed to fire.
    pub generation: u64,
    /// Frames sampled over the lifetime of this state.
    pub frames_sampled: u64,
    /// Payloads decoded over the lifetime of this state.
    pub payloads_decoded: u64,
    /// The most recent resolution outcome, if any.
    pub last_outcome: Option<ScanOutcome>,
}

impl ScannerState {
    /// Fresh state in `Idle`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: ScanPhase::Idle,
            generation: 0,
            frames_sampled: 0,
            payloads_decoded: 0,
            last_outcome: None,
        }
    }

    /// Whether the loop may accept a `Start`.
    #[must_use]
    pub const fn can_start(&self) -> bool {
        matches!(
            self.phase,
            ScanPhase::Idle | ScanPhase::Failed(_) | ScanPhase::Stopped
        )
    }
}

impl Default for ScannerState {
    fn default() -> Self {
        Self::new()
    }
}
