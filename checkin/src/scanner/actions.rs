//! Scanner actions: external commands plus the results of the loop's own
//! effects.

use crate::scanner::capture::CaptureFailure;
use crate::scanner::state::ScanOutcome;

/// Everything the scanner reducer can receive.
#[derive(Debug, Clone)]
pub enum ScannerAction {
    // Commands
    /// Begin a scanning session (acquire the camera).
    Start,
    /// Resume sampling after a rejection was presented.
    Resume,
    /// Stop the session and release the camera.
    Stop,

    // Effect feedback
    /// The camera was acquired.
    CameraReady,
    /// Camera acquisition failed with a classified cause.
    CameraFailed(CaptureFailure),
    /// A sampling tick fired.
    Tick {
        /// Generation the tick was scheduled under.
        generation: u64,
    },
    /// A frame was sampled but held no readable payload (or no frame was
    /// ready). Expected for most frames; the loop just ticks again.
    FrameEmpty {
        /// Generation the sample belonged to.
        generation: u64,
    },
    /// A frame decoded into a payload.
    PayloadDecoded {
        /// Generation the sample belonged to.
        generation: u64,
        /// The decoded text payload.
        payload: String,
    },
    /// The resolver finished with an outcome.
    ResolutionSettled(ScanOutcome),
}
