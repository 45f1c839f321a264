//! Capability boundaries for the decode loop.
//!
//! This crate implements neither a camera driver nor a QR decoding
//! algorithm. Both are consumed as injected capabilities: the camera hands
//! over pixel buffers, the decoder turns one buffer into at most one text
//! payload.

use async_trait::async_trait;
use thiserror::Error;

/// One sampled video frame: packed RGBA pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Packed pixel data.
    pub pixels: Vec<u8>,
}

/// Classified camera-acquisition failures.
///
/// These are user-facing: the operator needs to know whether to fix
/// permissions, plug in a device, or close the other app holding it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureFailure {
    /// Access to the camera was denied.
    #[error("camera access was denied")]
    PermissionDenied,

    /// No camera device is available.
    #[error("no camera device was found")]
    DeviceNotFound,

    /// The device exists but is held elsewhere.
    #[error("the camera device is busy")]
    DeviceBusy,

    /// Anything else.
    #[error("camera failure: {0}")]
    Unknown(String),
}

/// A live video source.
///
/// The device is exclusively owned by one scan loop at a time; `acquire` on a
/// port whose previous handle was never released must force-release it first.
#[async_trait]
pub trait CameraPort: Send + Sync {
    /// Acquire the device, force-releasing any prior handle.
    ///
    /// # Errors
    ///
    /// Returns a classified [`CaptureFailure`] on denial or absence.
    async fn acquire(&self) -> Result<(), CaptureFailure>;

    /// The current frame, or `None` while the source has no frame ready
    /// (or nothing is acquired). Never an error: a frameless instant is an
    /// expected state, the loop simply samples again next tick.
    async fn sample(&self) -> Option<FrameBuffer>;

    /// Release the device. Idempotent; safe to call from any state.
    async fn release(&self);
}

/// Decodes one symbol payload out of a pixel buffer.
pub trait SymbolDecoder: Send + Sync {
    /// The decoded text payload, or `None` when the frame holds no readable
    /// symbol. Partial or blurred frames are `None`, never an error — most
    /// frames do not contain a symbol at all.
    fn decode(&self, frame: &FrameBuffer) -> Option<String>;
}
