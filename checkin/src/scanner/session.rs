//! The scan session: one controller owning one decode loop.

use crate::scanner::actions::ScannerAction;
use crate::scanner::environment::ScannerEnvironment;
use crate::scanner::reducer::ScannerReducer;
use crate::scanner::state::{ScanOutcome, ScanPhase, ScannerState};
use soiree_runtime::{Store, StoreError};
use std::time::Duration;

/// Controller for a camera-bound scanning session.
///
/// Wraps a runtime store around the scanner reducer. One session owns the
/// camera capability for its lifetime; dropping the session without calling
/// [`ScanSession::stop`] leaves the device to be force-released by the next
/// acquisition.
pub struct ScanSession {
    store: Store<ScannerState, ScannerAction, ScannerEnvironment, ScannerReducer>,
}

impl ScanSession {
    /// Create a session over the given capabilities.
    #[must_use]
    pub fn new(env: ScannerEnvironment) -> Self {
        Self {
            store: Store::new(ScannerState::new(), ScannerReducer::new(), env),
        }
    }

    /// Start scanning: acquire the camera and begin sampling.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the session's store is
    /// shutting down.
    pub async fn start(&self) -> Result<(), StoreError> {
        self.store.send(ScannerAction::Start).await.map(|_| ())
    }

    /// Resume sampling after a rejection was presented.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the session's store is
    /// shutting down.
    pub async fn resume(&self) -> Result<(), StoreError> {
        self.store.send(ScannerAction::Resume).await.map(|_| ())
    }

    /// Stop scanning, cancel the pending tick, and release the camera.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the session's store is
    /// shutting down.
    pub async fn stop(&self) -> Result<(), StoreError> {
        self.store.send(ScannerAction::Stop).await.map(|_| ())
    }

    /// Current phase of the loop.
    pub async fn phase(&self) -> ScanPhase {
        self.store.state(|s| s.phase.clone()).await
    }

    /// Frames sampled so far.
    pub async fn frames_sampled(&self) -> u64 {
        self.store.state(|s| s.frames_sampled).await
    }

    /// The most recent resolution outcome, if any.
    pub async fn last_outcome(&self) -> Option<ScanOutcome> {
        self.store.state(|s| s.last_outcome.clone()).await
    }

    /// Wait for the next resolution outcome.
    ///
    /// Subscribes to the session's action stream first and then consults the
    /// state, so an outcome that settled a moment ago is still observed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if no resolution settles in time, or
    /// [`StoreError::ChannelClosed`] if the session is going away.
    pub async fn wait_for_outcome(&self, timeout: Duration) -> Result<ScanOutcome, StoreError> {
        let mut rx = self.store.subscribe_actions();

        if let Some(outcome) = self.last_outcome().await {
            return Ok(outcome);
        }

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(ScannerAction::ResolutionSettled(outcome)) => return Ok(outcome),
                    Ok(_) => {},
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {},
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)] // Test code

    use super::*;
    use crate::resolver::RejectReason;
    use crate::scanner::capture::CaptureFailure;
    use crate::scanner::mocks::{
        PixelTextDecoder, ScriptedCamera, ScriptedResolver, blank_frame, text_frame,
    };
    use std::sync::Arc;

    const INTERVAL: Duration = Duration::from_millis(2);

    fn session(
        camera: Arc<ScriptedCamera>,
        resolver: Arc<ScriptedResolver>,
    ) -> ScanSession {
        ScanSession::new(
            ScannerEnvironment::new(camera, Arc::new(PixelTextDecoder), resolver)
                .with_frame_interval(INTERVAL)
                .with_linger(Duration::from_millis(10)),
        )
    }

    async fn wait_for_phase(session: &ScanSession, want: &ScanPhase) {
        for _ in 0..500 {
            if session.phase().await == *want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("phase never became {want:?}, is {:?}", session.phase().await);
    }

    async fn wait_for_release(camera: &ScriptedCamera) {
        for _ in 0..500 {
            if !camera.is_acquired() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("camera was never released");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn a_planted_token_is_decoded_and_resolved() {
        let camera = Arc::new(ScriptedCamera::scripted(vec![
            None,
            Some(blank_frame()),
            Some(text_frame("EVT-jane")),
        ]));
        let resolver = Arc::new(ScriptedResolver::welcoming("Jane Doe"));
        let session = session(camera.clone(), resolver.clone());

        session.start().await.unwrap();
        let outcome = session
            .wait_for_outcome(Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ScanOutcome::Welcomed {
                guest_name: "Jane Doe".into()
            }
        );
        assert_eq!(resolver.calls(), 1);
        // Empty frames were skipped silently before the decode landed.
        assert!(session.frames_sampled().await >= 3);

        // A successful admission lingers briefly, then the loop stops itself
        // and releases the camera.
        wait_for_phase(&session, &ScanPhase::Stopped).await;
        wait_for_release(&camera).await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_halts_sampling_even_though_frames_keep_arriving() {
        let camera = Arc::new(ScriptedCamera::looping_blank());
        let resolver = Arc::new(ScriptedResolver::with_outcomes(Vec::new()));
        let session = session(camera.clone(), resolver);

        session.start().await.unwrap();
        wait_for_phase(&session, &ScanPhase::Active).await;
        tokio::time::sleep(INTERVAL * 10).await;

        session.stop().await.unwrap();
        wait_for_phase(&session, &ScanPhase::Stopped).await;
        wait_for_release(&camera).await;

        // Let any in-flight sample drain, then hold the counter steady: a
        // stray tick gets plenty of chances to fire, and none may.
        tokio::time::sleep(INTERVAL * 5).await;
        let samples_at_stop = camera.samples();
        tokio::time::sleep(INTERVAL * 20).await;
        assert_eq!(camera.samples(), samples_at_stop);
        assert!(samples_at_stop >= 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn denied_camera_fails_closed_without_retry() {
        let camera = Arc::new(ScriptedCamera::failing(CaptureFailure::PermissionDenied));
        let resolver = Arc::new(ScriptedResolver::with_outcomes(Vec::new()));
        let session = session(camera.clone(), resolver);

        session.start().await.unwrap();
        wait_for_phase(&session, &ScanPhase::Failed(CaptureFailure::PermissionDenied)).await;

        // No automatic retry: the failure state holds until an explicit start.
        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(
            session.phase().await,
            ScanPhase::Failed(CaptureFailure::PermissionDenied)
        );
        assert_eq!(camera.samples(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_scan_lingers_until_resumed() {
        let camera = Arc::new(ScriptedCamera::scripted(vec![Some(text_frame(
            "EVT-unknown",
        ))]));
        let resolver = Arc::new(ScriptedResolver::rejecting(RejectReason::NotFound));
        let session = session(camera.clone(), resolver);

        session.start().await.unwrap();
        let outcome = session
            .wait_for_outcome(Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(outcome, ScanOutcome::Rejected(RejectReason::NotFound));

        // Rejections wait for the operator.
        wait_for_phase(&session, &ScanPhase::Presenting).await;
        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(session.phase().await, ScanPhase::Presenting);

        // Resuming re-enters the sampling loop.
        session.resume().await.unwrap();
        wait_for_phase(&session, &ScanPhase::Active).await;
        let before = camera.samples();
        tokio::time::sleep(INTERVAL * 10).await;
        assert!(camera.samples() > before);

        session.stop().await.unwrap();
        wait_for_phase(&session, &ScanPhase::Stopped).await;
    }
}
