//! Scripted capability doubles for the scanner.
//!
//! These stand in for the real camera and decoder in tests and in headless
//! deployments. The camera plays back a frame script; the decoder reads a
//! frame's pixel bytes as UTF-8 text, so a test can plant a token inside a
//! frame with [`text_frame`] and blanks with [`blank_frame`].

use crate::error::CheckinError;
use crate::model::Credential;
use crate::resolver::{RejectReason, ResolvePort, Resolution};
use crate::scanner::capture::{CameraPort, CaptureFailure, FrameBuffer, SymbolDecoder};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// A frame whose pixels carry `payload` as UTF-8 bytes.
#[must_use]
pub fn text_frame(payload: &str) -> FrameBuffer {
    FrameBuffer {
        width: u32::try_from(payload.len()).unwrap_or(u32::MAX),
        height: 1,
        pixels: payload.as_bytes().to_vec(),
    }
}

/// A frame with no readable symbol in it.
#[must_use]
pub fn blank_frame() -> FrameBuffer {
    FrameBuffer {
        width: 2,
        height: 2,
        pixels: vec![0; 16],
    }
}

/// Scripted [`CameraPort`].
///
/// Plays back a queue of sample results, then falls back to a configurable
/// steady-state frame. Counts acquisitions, releases, and samples so tests
/// can assert that a stopped loop stops sampling and releases the device.
pub struct ScriptedCamera {
    failure: Option<CaptureFailure>,
    script: Mutex<VecDeque<Option<FrameBuffer>>>,
    fallback: Option<FrameBuffer>,
    acquired: AtomicBool,
    acquisitions: AtomicU64,
    releases: AtomicU64,
    samples: AtomicU64,
}

impl ScriptedCamera {
    /// A camera that always has a blank frame ready.
    #[must_use]
    pub fn looping_blank() -> Self {
        Self::scripted(Vec::new())
    }

    /// A camera that plays `frames` in order, then blanks forever.
    #[must_use]
    pub fn scripted(frames: Vec<Option<FrameBuffer>>) -> Self {
        Self {
            failure: None,
            script: Mutex::new(frames.into()),
            fallback: Some(blank_frame()),
            acquired: AtomicBool::new(false),
            acquisitions: AtomicU64::new(0),
            releases: AtomicU64::new(0),
            samples: AtomicU64::new(0),
        }
    }

    /// A camera whose acquisition fails with `failure`.
    #[must_use]
    pub fn failing(failure: CaptureFailure) -> Self {
        Self {
            failure: Some(failure),
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            acquired: AtomicBool::new(false),
            acquisitions: AtomicU64::new(0),
            releases: AtomicU64::new(0),
            samples: AtomicU64::new(0),
        }
    }

    /// Whether a handle is currently held.
    #[must_use]
    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Successful acquisitions so far.
    #[must_use]
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Releases so far (explicit and forced).
    #[must_use]
    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::SeqCst)
    }

    /// Frames sampled so far.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraPort for ScriptedCamera {
    async fn acquire(&self) -> Result<(), CaptureFailure> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        // Exclusive ownership: a still-held prior handle is force-released.
        if self.acquired.swap(true, Ordering::SeqCst) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn sample(&self) -> Option<FrameBuffer> {
        if !self.acquired.load(Ordering::SeqCst) {
            return None;
        }
        self.samples.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match scripted {
            Some(frame) => frame,
            None => self.fallback.clone(),
        }
    }

    async fn release(&self) {
        if self.acquired.swap(false, Ordering::SeqCst) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Decoder that reads a frame's pixel bytes as a UTF-8 payload.
///
/// Blank and non-text frames decode to `None`, like a real symbol decoder
/// looking at a frame without a code in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelTextDecoder;

impl SymbolDecoder for PixelTextDecoder {
    fn decode(&self, frame: &FrameBuffer) -> Option<String> {
        let text = std::str::from_utf8(&frame.pixels).ok()?;
        let text = text.trim_matches('\0').trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

/// Resolver double that rejects everything as unknown.
#[derive(Debug, Default)]
pub struct NullResolver;

#[async_trait]
impl ResolvePort for NullResolver {
    async fn resolve(&self, _token: &Credential) -> Result<Resolution, CheckinError> {
        Ok(Resolution::Rejected(RejectReason::NotFound))
    }
}

/// Resolver double that plays back scripted outcomes, then rejects.
pub struct ScriptedResolver {
    outcomes: Mutex<VecDeque<Result<Resolution, CheckinError>>>,
    calls: AtomicU64,
}

impl ScriptedResolver {
    /// Play back `outcomes` in order; afterwards every call is `NotFound`.
    #[must_use]
    pub fn with_outcomes(outcomes: Vec<Result<Resolution, CheckinError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicU64::new(0),
        }
    }

    /// A resolver that admits `guest_name` on the first call.
    #[must_use]
    pub fn welcoming(guest_name: &str) -> Self {
        Self::with_outcomes(vec![Ok(Resolution::Welcomed {
            guest_name: guest_name.to_string(),
        })])
    }

    /// A resolver that rejects with `reason` on every scripted call.
    #[must_use]
    pub fn rejecting(reason: RejectReason) -> Self {
        Self::with_outcomes(vec![Ok(Resolution::Rejected(reason))])
    }

    /// Resolutions performed so far.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResolvePort for ScriptedResolver {
    async fn resolve(&self, _token: &Credential) -> Result<Resolution, CheckinError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Ok(Resolution::Rejected(RejectReason::NotFound)))
    }
}
