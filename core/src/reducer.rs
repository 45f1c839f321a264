//! The core trait for feature logic.
//!
//! A reducer is a pure function over its state: it validates the incoming
//! action, mutates state in place, and returns effect descriptions for the
//! runtime to execute. All I/O lives in effects; the reducer itself can be
//! exercised in tests at memory speed with no scheduler, camera, or store.

use crate::effect::Effect;
use smallvec::SmallVec;

/// Number of effects a reduce step can return without heap allocation.
///
/// Transitions in this codebase emit at most a cancel + an acquire/release +
/// a reschedule, so four inline slots cover every real case.
pub const INLINE_EFFECTS: usize = 4;

/// A pure state transition function with declared dependencies.
pub trait Reducer {
    /// The state type this reducer operates on.
    type State;

    /// The action type this reducer processes.
    type Action;

    /// The injected dependencies this reducer reads (clock, capabilities).
    type Environment;

    /// Reduce an action into state changes and effect descriptions.
    ///
    /// Invariants the runtime relies on:
    ///
    /// - no I/O is performed here; anything observable happens via the
    ///   returned effects
    /// - the reducer never panics; invalid or stale actions reduce to no
    ///   state change and no effects
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; INLINE_EFFECTS]>;
}
