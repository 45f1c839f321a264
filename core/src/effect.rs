//! Side effect descriptions.
//!
//! Effects are values returned from reducers, not executed code. The runtime
//! store interprets them: spawning futures, scheduling delays, and managing
//! cancellation handles. Cancellation is first-class here because the frame
//! decode loop must be able to revoke an already-scheduled sampling tick —
//! merely ignoring a stale tick is not enough when the scheduler handle can
//! still fire.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Identifier for a cancellable effect.
///
/// Pairs a static name with a numeric tag so one logical slot (say, the scan
/// loop's sampling tick) can be distinguished across restarts of the same
/// feature: each restart bumps the tag, and cancelling the old id can never
/// touch the new schedule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EffectId {
    name: Cow<'static, str>,
    tag: u64,
}

impl EffectId {
    /// Create an effect id with tag 0.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            tag: 0,
        }
    }

    /// Create an effect id scoped to a numeric tag (e.g. a session generation).
    #[must_use]
    pub const fn tagged(name: &'static str, tag: u64) -> Self {
        Self {
            name: Cow::Borrowed(name),
            tag,
        }
    }

    /// The name component of this id.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag component of this id.
    #[must_use]
    pub const fn tag(&self) -> u64 {
        self.tag
    }
}

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.tag)
    }
}

/// A description of a side effect to be executed by the runtime.
///
/// # Type Parameters
///
/// - `Action`: the action type an effect can feed back into the reducer
#[allow(missing_docs)]
pub enum Effect<Action> {
    /// No-op effect.
    None,

    /// Run effects concurrently.
    Parallel(Vec<Effect<Action>>),

    /// Run effects in order, each completing before the next starts.
    Sequential(Vec<Effect<Action>>),

    /// Dispatch an action after a delay (timers, display linger, poll ticks).
    Delay {
        /// How long to wait.
        duration: Duration,
        /// Action to dispatch after the delay.
        action: Box<Action>,
    },

    /// Arbitrary async computation.
    ///
    /// If the future resolves to `Some`, the action is fed back into the
    /// reducer.
    Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

    /// A cancellable effect registered under `id`.
    ///
    /// Registering a new effect under an id that is already live aborts the
    /// previous one first, so a slot can hold at most one in-flight effect.
    Cancellable {
        /// Registration key for later cancellation.
        id: EffectId,
        /// The effect to run under that key.
        effect: Box<Effect<Action>>,
    },

    /// Abort the in-flight effect registered under `id`, if any.
    ///
    /// The aborted task is torn down immediately; a pending `Delay` under the
    /// id will never dispatch its action.
    Cancel(EffectId),
}

impl<Action> std::fmt::Debug for Effect<Action>
where
    Action: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::None => write!(f, "Effect::None"),
            Effect::Parallel(effects) => f.debug_tuple("Effect::Parallel").field(effects).finish(),
            Effect::Sequential(effects) => {
                f.debug_tuple("Effect::Sequential").field(effects).finish()
            },
            Effect::Delay { duration, action } => f
                .debug_struct("Effect::Delay")
                .field("duration", duration)
                .field("action", action)
                .finish(),
            Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            Effect::Cancellable { id, effect } => f
                .debug_struct("Effect::Cancellable")
                .field("id", id)
                .field("effect", effect)
                .finish(),
            Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
        }
    }
}

impl<Action> Effect<Action> {
    /// Combine effects to run concurrently.
    #[must_use]
    pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
        Effect::Parallel(effects)
    }

    /// Chain effects to run sequentially.
    #[must_use]
    pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
        Effect::Sequential(effects)
    }

    /// Wrap this effect so it can be cancelled under `id`.
    #[must_use]
    pub fn cancellable(self, id: EffectId) -> Effect<Action> {
        Effect::Cancellable {
            id,
            effect: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)] // Test code

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Ping,
    }

    #[test]
    fn effect_ids_distinguish_tags() {
        let a = EffectId::tagged("scanner/tick", 1);
        let b = EffectId::tagged("scanner/tick", 2);
        assert_ne!(a, b);
        assert_eq!(a, EffectId::tagged("scanner/tick", 1));
        assert_eq!(a.to_string(), "scanner/tick#1");
    }

    #[test]
    fn cancellable_wraps_inner_effect() {
        let effect: Effect<TestAction> = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(TestAction::Ping),
        }
        .cancellable(EffectId::new("tick"));

        match effect {
            Effect::Cancellable { id, effect } => {
                assert_eq!(id, EffectId::new("tick"));
                assert!(matches!(*effect, Effect::Delay { .. }));
            },
            other => panic!("expected cancellable effect, got {other:?}"),
        }
    }

    #[test]
    fn debug_formatting_is_stable() {
        let effect: Effect<TestAction> = Effect::Cancel(EffectId::new("tick"));
        assert_eq!(format!("{effect:?}"), "Effect::Cancel(EffectId { name: \"tick\", tag: 0 })");
    }
}
