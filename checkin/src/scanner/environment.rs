//! Injected dependencies for the scanner reducer.

use crate::resolver::ResolvePort;
use crate::scanner::capture::{CameraPort, SymbolDecoder};
use std::sync::Arc;
use std::time::Duration;

/// Capabilities and tuning for one scan loop.
#[derive(Clone)]
pub struct ScannerEnvironment {
    /// The video source.
    pub camera: Arc<dyn CameraPort>,
    /// The symbol decoder.
    pub decoder: Arc<dyn SymbolDecoder>,
    /// The check-in resolver.
    pub resolver: Arc<dyn ResolvePort>,
    /// Interval between sampling ticks. One decode attempt per display
    /// refresh is plenty; there is no busy spin.
    pub frame_interval: Duration,
    /// How long a successful result stays on screen before the loop stops
    /// itself.
    pub linger: Duration,
}

impl ScannerEnvironment {
    /// Environment with default cadence (~30 ticks/s, 2 s result linger).
    #[must_use]
    pub fn new(
        camera: Arc<dyn CameraPort>,
        decoder: Arc<dyn SymbolDecoder>,
        resolver: Arc<dyn ResolvePort>,
    ) -> Self {
        Self {
            camera,
            decoder,
            resolver,
            frame_interval: Duration::from_millis(33),
            linger: Duration::from_secs(2),
        }
    }

    /// Override the sampling interval.
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Override the result linger duration.
    #[must_use]
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }
}
