//! Ergonomic reducer testing with Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use soiree_core::effect::Effect;
use soiree_core::reducer::Reducer;

type StateAssertion<S> = Box<dyn FnOnce(&S)>;
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent harness for exercising a reducer step.
///
/// # Example
///
/// ```ignore
/// ReducerTest::new(ScannerReducer)
///     .with_env(test_environment())
///     .given_state(ScannerState::default())
///     .when_action(ScannerAction::Stop)
///     .then_state(|state| assert_eq!(state.phase, ScanPhase::Stopped))
///     .then_effects(assertions::assert_has_cancel_effect)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a test around `reducer`.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Provide the environment.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Given: the starting state.
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// When: the action under test.
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Then: assert on the resulting state.
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Then: assert on the returned effects.
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the reducer step and every registered assertion.
    ///
    /// Returns the final state so multi-step tests can chain into a fresh
    /// `ReducerTest` with `given_state`.
    ///
    /// # Panics
    ///
    /// Panics if state, action, or environment were not provided, or if an
    /// assertion fails.
    #[allow(clippy::expect_used)] // Test harness can panic on misuse
    pub fn run(self) -> S {
        let mut state = self
            .initial_state
            .expect("initial state must be set with given_state()");
        let action = self.action.expect("action must be set with when_action()");
        let env = self
            .environment
            .expect("environment must be set with with_env()");

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }

        state
    }
}

/// Assertion helpers over effect slices.
pub mod assertions {
    use soiree_core::effect::{Effect, EffectId};

    /// Assert that no effects were returned (empty or a lone `None`).
    ///
    /// # Panics
    ///
    /// Panics if any real effect is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "expected no effects, found {}: {effects:?}",
            effects.len(),
        );
    }

    /// Assert the number of effects.
    ///
    /// # Panics
    ///
    /// Panics if the count differs.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "expected {expected} effects, found {}",
            effects.len()
        );
    }

    /// Assert at least one `Future` effect is present (possibly wrapped in a
    /// cancellable registration).
    ///
    /// # Panics
    ///
    /// Panics if none is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(contains_future),
            "expected at least one Future effect, found none"
        );
    }

    /// Assert that the in-flight effect registered under `id` is cancelled.
    ///
    /// # Panics
    ///
    /// Panics if no matching `Cancel` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A>(effects: &[Effect<A>], id: &EffectId) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancel(cancelled) if cancelled == id)),
            "expected a Cancel effect for {id}, found none"
        );
    }

    /// Assert that some effect is registered for cancellation under `id`.
    ///
    /// # Panics
    ///
    /// Panics if no matching `Cancellable` registration is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_registers<A>(effects: &[Effect<A>], id: &EffectId) {
        assert!(
            effects
                .iter()
                .any(|e| matches!(e, Effect::Cancellable { id: registered, .. } if registered == id)),
            "expected a Cancellable registration for {id}, found none"
        );
    }

    fn contains_future<A>(effect: &Effect<A>) -> bool {
        match effect {
            Effect::Future(_) => true,
            Effect::Cancellable { effect, .. } => contains_future(effect),
            Effect::Parallel(effects) | Effect::Sequential(effects) => {
                effects.iter().any(contains_future)
            },
            Effect::None | Effect::Delay { .. } | Effect::Cancel(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::{SmallVec, smallvec};

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Decrement,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                TestAction::Decrement => {
                    state.count -= 1;
                    smallvec![Effect::None]
                },
            }
        }
    }

    #[test]
    fn runs_assertions_and_returns_state() {
        let state = ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| assert_eq!(state.count, 1))
            .then_effects(assertions::assert_no_effects)
            .run();

        assert_eq!(state.count, 1);
    }

    #[test]
    fn chains_steps_through_returned_state() {
        let after_first = ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 5 })
            .when_action(TestAction::Decrement)
            .run();

        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(after_first)
            .when_action(TestAction::Decrement)
            .then_state(|state| assert_eq!(state.count, 3))
            .run();
    }

    #[test]
    fn effect_count_assertions() {
        assertions::assert_effects_count::<TestAction>(&[Effect::None], 1);
        assertions::assert_no_effects::<TestAction>(&[]);
    }
}
