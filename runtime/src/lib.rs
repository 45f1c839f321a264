//! # Soiree Runtime
//!
//! The `Store` runtime that drives soiree reducers.
//!
//! A store owns one feature's state, serializes actions through its reducer
//! under a write lock, and executes the returned effect descriptions on the
//! tokio runtime. Actions produced by effects are fed back into the reducer
//! and broadcast to observers, which is how a caller can wait for a terminal
//! action (e.g. a scan session waiting for its resolution outcome).
//!
//! Cancellation is handled by a registry keyed by [`EffectId`]: a
//! `Effect::Cancellable` spawns its work on an abortable task and records the
//! abort handle; `Effect::Cancel` tears that task down immediately. An
//! aborted delay never dispatches its action — the guarantee the frame decode
//! loop relies on when it stops.

use soiree_core::effect::{Effect, EffectId};
use soiree_core::reducer::Reducer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast, watch};
use tokio::task::AbortHandle;

/// Errors surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `send()` was called after shutdown began.
    #[error("store is shutting down")]
    ShutdownInProgress,

    /// Shutdown timed out with effects still running.
    #[error("shutdown timed out with {0} effects still running")]
    ShutdownTimeout(usize),

    /// Timed out waiting for a matching action.
    #[error("timeout waiting for action")]
    Timeout,

    /// The action broadcast channel closed (store is going away).
    #[error("action broadcast channel closed")]
    ChannelClosed,
}

/// Handle for awaiting completion of the effects started by one `send`.
///
/// Effects run asynchronously; `send()` returns once they are started. The
/// handle tracks the immediate effects of that action (not the effects of
/// feedback actions they produce).
#[derive(Clone)]
pub struct EffectHandle {
    pending: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let pending = Arc::new(AtomicUsize::new(0));
        let (notifier, completion) = watch::channel(());

        let handle = Self {
            pending: Arc::clone(&pending),
            completion,
        };
        let tracking = EffectTracking { pending, notifier };

        (handle, tracking)
    }

    /// A handle whose effects are already complete.
    #[must_use]
    pub fn completed() -> Self {
        let (notifier, completion) = watch::channel(());
        let _ = notifier.send(());
        Self {
            pending: Arc::new(AtomicUsize::new(0)),
            completion,
        }
    }

    /// Wait until every tracked effect has finished (or was aborted).
    pub async fn wait(&mut self) {
        while self.pending.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for effect completion, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when the
    /// timeout expires.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }

    /// Number of tracked effects still in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal completion tracking shared by the effects of one action.
#[derive(Clone)]
struct EffectTracking {
    pending: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// RAII guard that decrements tracking on drop.
///
/// Effects can be aborted at any await point; dropping the guard (rather than
/// decrementing after the work) keeps the counter honest even then.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// RAII guard for the store-wide pending counter used by shutdown.
struct CounterGuard(Arc<AtomicUsize>);

impl Drop for CounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One live cancellable effect: the abort handle plus a sequence number so a
/// task that finished naturally cannot evict a successor registered under the
/// same id.
struct Slot {
    seq: u64,
    handle: AbortHandle,
}

/// Registry of in-flight cancellable effects, keyed by [`EffectId`].
struct CancellationRegistry {
    slots: Mutex<HashMap<EffectId, Slot>>,
    seq: AtomicU64,
}

impl CancellationRegistry {
    fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            seq: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EffectId, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new task under `id`, aborting any predecessor. One id holds
    /// at most one in-flight effect.
    fn register(&self, id: EffectId, handle: AbortHandle) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let previous = self.lock().insert(id, Slot { seq, handle });
        if let Some(previous) = previous {
            previous.handle.abort();
            metrics::counter!("store.effects.superseded").increment(1);
        }
        seq
    }

    /// Abort and remove the task registered under `id`, if any.
    fn cancel(&self, id: &EffectId) {
        if let Some(slot) = self.lock().remove(id) {
            slot.handle.abort();
            metrics::counter!("store.effects.cancelled").increment(1);
            tracing::trace!(effect_id = %id, "Cancelled in-flight effect");
        }
    }

    /// Drop the slot after natural completion, unless a successor took it.
    fn release(&self, id: &EffectId, seq: u64) {
        let mut slots = self.lock();
        if slots.get(id).is_some_and(|slot| slot.seq == seq) {
            slots.remove(id);
        }
    }

    fn live(&self) -> usize {
        self.lock().len()
    }
}

/// The store: runtime coordinator for one reducer.
///
/// # Type Parameters
///
/// - `S`: state type
/// - `A`: action type
/// - `E`: environment type
/// - `R`: reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: Arc<RwLock<S>>,
    reducer: Arc<R>,
    environment: Arc<E>,
    shutdown: Arc<AtomicBool>,
    pending_effects: Arc<AtomicUsize>,
    cancellations: Arc<CancellationRegistry>,
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            reducer: Arc::clone(&self.reducer),
            environment: Arc::clone(&self.environment),
            shutdown: Arc::clone(&self.shutdown),
            pending_effects: Arc::clone(&self.pending_effects),
            cancellations: Arc::clone(&self.cancellations),
            action_broadcast: self.action_broadcast.clone(),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Clone + Send + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a store with the default action broadcast capacity (16).
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
    }

    /// Create a store with a custom action broadcast capacity.
    ///
    /// Raise the capacity when many slow observers subscribe (each observer
    /// lags independently; a lagged observer skips old actions).
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity);

        Self {
            state: Arc::new(RwLock::new(initial_state)),
            reducer: Arc::new(reducer),
            environment: Arc::new(environment),
            shutdown: Arc::new(AtomicBool::new(false)),
            pending_effects: Arc::new(AtomicUsize::new(0)),
            cancellations: Arc::new(CancellationRegistry::new()),
            action_broadcast,
        }
    }

    /// Send an action through the reducer and start its effects.
    ///
    /// The reducer runs synchronously under the state write lock; effects run
    /// on spawned tasks after the lock is released. Concurrent `send` calls
    /// serialize at the reducer, so no two reductions observe the same state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once shutdown has begun.
    pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::warn!("Rejected action: store is shutting down");
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("store.actions.total").increment(1);

        let (handle, tracking) = EffectHandle::new();

        let effects = {
            let mut state = self.state.write().await;
            let start = std::time::Instant::now();
            let effects = self
                .reducer
                .reduce(&mut *state, action, self.environment.as_ref());
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());
            effects
        };

        for effect in effects {
            self.execute_effect(effect, tracking.clone());
        }

        Ok(handle)
    }

    /// Send an action and wait for an effect-produced action matching
    /// `predicate`.
    ///
    /// Subscribes to the action broadcast *before* sending, so a fast effect
    /// cannot slip its result past the observer.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if no matching action arrives in time
    /// - [`StoreError::ChannelClosed`] if the broadcast closes
    /// - [`StoreError::ShutdownInProgress`] if shutdown has begun
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.action_broadcast.subscribe();

        self.send(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Subscribe to every action produced by effects.
    ///
    /// Actions passed directly to `send` are not broadcast; only the feedback
    /// actions effects produce are.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.action_broadcast.subscribe()
    }

    /// Read state through a closure, releasing the lock promptly.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.state.read().await;
        f(&*state)
    }

    /// Number of live cancellable-effect registrations (diagnostics).
    #[must_use]
    pub fn live_cancellable_effects(&self) -> usize {
        self.cancellations.live()
    }

    /// Begin graceful shutdown: reject new actions, wait for in-flight
    /// effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// when `timeout` expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("Initiating graceful shutdown");
        self.shutdown.store(true, Ordering::Release);

        let start = std::time::Instant::now();
        loop {
            let pending = self.pending_effects.load(Ordering::Acquire);
            if pending == 0 {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                tracing::error!(pending, "Shutdown timed out with effects running");
                return Err(StoreError::ShutdownTimeout(pending));
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    /// Dispatch a feedback action produced by an effect: broadcast it to
    /// observers, then run it through the reducer.
    async fn feedback(&self, action: A) {
        let _ = self.action_broadcast.send(action.clone());
        let _ = self.send(action).await;
    }

    /// Start executing one effect description.
    fn execute_effect(&self, effect: Effect<A>, tracking: EffectTracking) {
        match effect {
            Effect::None => {
                metrics::counter!("store.effects.executed", "type" => "none").increment(1);
            },
            Effect::Parallel(effects) => {
                metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                for effect in effects {
                    self.execute_effect(effect, tracking.clone());
                }
            },
            Effect::Cancel(id) => {
                metrics::counter!("store.effects.executed", "type" => "cancel").increment(1);
                self.cancellations.cancel(&id);
            },
            Effect::Cancellable { id, effect } => {
                metrics::counter!("store.effects.executed", "type" => "cancellable").increment(1);
                self.spawn_cancellable(id, *effect, tracking);
            },
            effect @ (Effect::Future(_) | Effect::Delay { .. } | Effect::Sequential(_)) => {
                metrics::counter!("store.effects.executed", "type" => "task").increment(1);
                self.spawn_task(effect, tracking);
            },
        }
    }

    /// Run an effect on a detached task.
    fn spawn_task(&self, effect: Effect<A>, tracking: EffectTracking) {
        tracking.increment();
        self.pending_effects.fetch_add(1, Ordering::SeqCst);
        let pending_guard = CounterGuard(Arc::clone(&self.pending_effects));

        let store = self.clone();
        tokio::spawn(async move {
            let _done = DecrementGuard(tracking.clone());
            let _pending = pending_guard;
            Self::run_inline(store, effect, tracking).await;
        });
    }

    /// Run an effect on an abortable task registered under `id`.
    fn spawn_cancellable(&self, id: EffectId, effect: Effect<A>, tracking: EffectTracking) {
        tracking.increment();
        self.pending_effects.fetch_add(1, Ordering::SeqCst);
        let pending_guard = CounterGuard(Arc::clone(&self.pending_effects));

        let store = self.clone();
        let inner_tracking = tracking.clone();
        let task = tokio::spawn(async move {
            let _done = DecrementGuard(tracking);
            let _pending = pending_guard;
            Self::run_inline(store, effect, inner_tracking).await;
        });

        let seq = self.cancellations.register(id.clone(), task.abort_handle());

        // Reap the registry slot once the task finishes on its own. The
        // sequence check keeps a finished task from evicting a successor
        // registered under the same id.
        let registry = Arc::clone(&self.cancellations);
        tokio::spawn(async move {
            let _ = task.await;
            registry.release(&id, seq);
        });
    }

    /// Interpret an effect inside an already-spawned task.
    ///
    /// Boxed for recursion. Nested `Parallel` groups stay inside the current
    /// task so that aborting a cancellable effect tears down its whole
    /// subtree; nested `Cancellable` effects are handed back to the registry
    /// and detach from the current task.
    fn run_inline(
        store: Self,
        effect: Effect<A>,
        tracking: EffectTracking,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        store.feedback(action).await;
                    }
                },
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    store.feedback(*action).await;
                },
                Effect::Parallel(effects) => {
                    let children = effects
                        .into_iter()
                        .map(|effect| {
                            Self::run_inline(store.clone(), effect, tracking.clone())
                        })
                        .collect::<Vec<_>>();
                    futures::future::join_all(children).await;
                },
                Effect::Sequential(effects) => {
                    for effect in effects {
                        Self::run_inline(store.clone(), effect, tracking.clone()).await;
                    }
                },
                Effect::Cancellable { id, effect } => {
                    store.spawn_cancellable(id, *effect, tracking.clone());
                },
                Effect::Cancel(id) => {
                    store.cancellations.cancel(&id);
                },
            }
        })
    }
}
