//! The scanner reducer: every transition of the decode loop in one place.

use crate::model::Credential;
use crate::scanner::actions::ScannerAction;
use crate::scanner::environment::ScannerEnvironment;
use crate::scanner::state::{ScanOutcome, ScanPhase, ScannerState};
use smallvec::{SmallVec, smallvec};
use soiree_core::effect::{Effect, EffectId};
use soiree_core::reducer::Reducer;
use std::sync::Arc;

/// Cancellation slot for the pending sampling tick of a generation.
fn tick_slot(generation: u64) -> EffectId {
    EffectId::tagged("scanner/tick", generation)
}

/// Cancellation slot for the post-success linger timer of a generation.
fn linger_slot(generation: u64) -> EffectId {
    EffectId::tagged("scanner/linger", generation)
}

/// Schedule the next sampling tick as a cancellable delay.
fn schedule_tick(
    generation: u64,
    env: &ScannerEnvironment,
) -> Effect<ScannerAction> {
    Effect::Delay {
        duration: env.frame_interval,
        action: Box::new(ScannerAction::Tick { generation }),
    }
    .cancellable(tick_slot(generation))
}

/// Release the camera on a detached effect. Used on every transition out of
/// `Active`-and-beyond, error paths included.
fn release_camera(env: &ScannerEnvironment) -> Effect<ScannerAction> {
    let camera = Arc::clone(&env.camera);
    Effect::Future(Box::pin(async move {
        camera.release().await;
        None
    }))
}

/// Reducer for the frame decode loop.
#[derive(Clone, Debug, Default)]
pub struct ScannerReducer;

impl ScannerReducer {
    /// Create the reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ScannerReducer {
    type State = ScannerState;
    type Action = ScannerAction;
    type Environment = ScannerEnvironment;

    #[allow(clippy::too_many_lines)] // One arm per transition of the machine
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ScannerAction::Start => {
                if !state.can_start() {
                    return smallvec![Effect::None];
                }

                state.generation += 1;
                state.phase = ScanPhase::Requesting;
                state.last_outcome = None;
                metrics::counter!("scanner.sessions.started").increment(1);
                tracing::debug!(generation = state.generation, "Requesting camera");

                let camera = Arc::clone(&env.camera);
                smallvec![Effect::Future(Box::pin(async move {
                    Some(match camera.acquire().await {
                        Ok(()) => ScannerAction::CameraReady,
                        Err(cause) => ScannerAction::CameraFailed(cause),
                    })
                }))]
            },

            ScannerAction::CameraReady => {
                if state.phase != ScanPhase::Requesting {
                    return smallvec![Effect::None];
                }
                state.phase = ScanPhase::Active;
                tracing::debug!(generation = state.generation, "Camera acquired, sampling");
                smallvec![schedule_tick(state.generation, env)]
            },

            ScannerAction::CameraFailed(cause) => {
                if state.phase != ScanPhase::Requesting {
                    return smallvec![Effect::None];
                }
                metrics::counter!("scanner.camera.failed").increment(1);
                tracing::warn!(%cause, "Camera acquisition failed");
                state.phase = ScanPhase::Failed(cause);
                // Acquisition may have failed partway; release is idempotent.
                smallvec![release_camera(env)]
            },

            ScannerAction::Tick { generation } => {
                // Liveness check at the top of the tick: a handle that
                // slipped past cancellation, or one from an older session,
                // must not sample.
                if state.phase != ScanPhase::Active || generation != state.generation {
                    return smallvec![Effect::None];
                }
                state.frames_sampled += 1;

                let camera = Arc::clone(&env.camera);
                let decoder = Arc::clone(&env.decoder);
                smallvec![Effect::Future(Box::pin(async move {
                    let action = match camera.sample().await {
                        Some(frame) => match decoder.decode(&frame) {
                            Some(payload) => ScannerAction::PayloadDecoded {
                                generation,
                                payload,
                            },
                            None => ScannerAction::FrameEmpty { generation },
                        },
                        None => ScannerAction::FrameEmpty { generation },
                    };
                    Some(action)
                }))]
            },

            ScannerAction::FrameEmpty { generation } => {
                if state.phase != ScanPhase::Active || generation != state.generation {
                    return smallvec![Effect::None];
                }
                // Frame without a symbol is the common case; tick again.
                smallvec![schedule_tick(generation, env)]
            },

            ScannerAction::PayloadDecoded {
                generation,
                payload,
            } => {
                // Reentrancy guard: while a resolution is pending the phase
                // is `Resolving`, so a racing second decode lands here and is
                // discarded.
                if state.phase != ScanPhase::Active || generation != state.generation {
                    return smallvec![Effect::None];
                }

                state.payloads_decoded += 1;
                let token = Credential::from(payload);
                state.phase = ScanPhase::Resolving {
                    token: token.clone(),
                };
                metrics::counter!("scanner.payloads.decoded").increment(1);

                let resolver = Arc::clone(&env.resolver);
                smallvec![
                    // No sampling while resolution is outstanding.
                    Effect::Cancel(tick_slot(generation)),
                    Effect::Future(Box::pin(async move {
                        let outcome = match resolver.resolve(&token).await {
                            Ok(resolution) => ScanOutcome::from(resolution),
                            Err(err) => ScanOutcome::Faulted {
                                detail: err.to_string(),
                            },
                        };
                        Some(ScannerAction::ResolutionSettled(outcome))
                    })),
                ]
            },

            ScannerAction::ResolutionSettled(outcome) => {
                if !matches!(state.phase, ScanPhase::Resolving { .. }) {
                    return smallvec![Effect::None];
                }

                let admitted = matches!(outcome, ScanOutcome::Welcomed { .. });
                tracing::info!(outcome = %outcome.message(), "Scan resolved");
                state.last_outcome = Some(outcome);
                state.phase = ScanPhase::Presenting;

                if admitted {
                    // Show the greeting briefly, then stop the whole session.
                    smallvec![
                        Effect::Delay {
                            duration: env.linger,
                            action: Box::new(ScannerAction::Stop),
                        }
                        .cancellable(linger_slot(state.generation))
                    ]
                } else {
                    // Rejections stay on screen; the operator decides whether
                    // to resume scanning or stop.
                    smallvec![Effect::None]
                }
            },

            ScannerAction::Resume => {
                if state.phase != ScanPhase::Presenting {
                    return smallvec![Effect::None];
                }
                state.phase = ScanPhase::Active;
                smallvec![schedule_tick(state.generation, env)]
            },

            ScannerAction::Stop => {
                if state.phase == ScanPhase::Stopped {
                    return smallvec![Effect::None];
                }
                state.phase = ScanPhase::Stopped;
                metrics::counter!("scanner.sessions.stopped").increment(1);
                tracing::debug!(generation = state.generation, "Scanner stopped");

                // Cancel the scheduler handles outright — a pending tick must
                // not fire into a stopped session — and release the camera
                // unconditionally.
                smallvec![
                    Effect::Cancel(tick_slot(state.generation)),
                    Effect::Cancel(linger_slot(state.generation)),
                    release_camera(env),
                ]
            },
        }
    }
}
