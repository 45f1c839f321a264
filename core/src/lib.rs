//! # Soiree Core
//!
//! Core traits and types for the soiree check-in architecture.
//!
//! The guest check-in subsystem is built as a set of small state machines
//! driven through a single pattern:
//!
//! - **State**: plain data owned by a feature (e.g. the scan loop phases)
//! - **Action**: every input a feature can receive (commands and the results
//!   of its own effects)
//! - **Reducer**: pure function `(State, Action, Environment) → Effects`
//! - **Effect**: a *description* of a side effect, executed by the runtime
//! - **Environment**: injected capabilities (clock, camera, decoder, stores)
//!
//! Keeping side effects as values is what makes the camera-bound decode loop
//! testable: a test can assert that stopping the loop emits a cancellation
//! for the pending sampling tick without ever touching a real scheduler.

pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

pub mod effect;
pub mod environment;
pub mod reducer;

pub use effect::{Effect, EffectId};
pub use environment::{Clock, SystemClock};
pub use reducer::Reducer;
