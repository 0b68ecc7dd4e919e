//! Generic state machine engine
//!
//! Drives one polymorphic state object per owning unit. Each simulation
//! tick runs `on_update` then `check_transition`; when the returned key
//! differs from the current one the engine exits the old state,
//! constructs a fresh instance through the factory, and enters it.
//! State instances are never reused across activations, so per-activation
//! fields (timers, in-flight attack sequences) always start clean and any
//! suspended work is dropped with the state it belongs to.

use std::fmt::Debug;

/// Key type identifying states in one behavior graph.
///
/// `ALL` enumerates every key so factories can be exercised at spawn.
pub trait StateKey: Copy + PartialEq + Debug + Send + Sync + 'static {
    const ALL: &'static [Self];
}

/// One node in a behavior graph, generic over the owning context `C`.
pub trait State<K, C>: Send + Sync {
    fn on_enter(&mut self, _owner: &mut C) {}
    fn on_update(&mut self, _owner: &mut C) {}
    fn on_exit(&mut self, _owner: &mut C) {}

    /// Decide the next state key. Returning the current key means
    /// "stay" and causes no re-entry.
    fn check_transition(&mut self, owner: &mut C) -> K;
}

pub type BoxedState<K, C> = Box<dyn State<K, C>>;

/// Maps a state key to a freshly constructed state instance.
///
/// Factories are exhaustive matches over closed key enums, so an
/// unmapped key cannot exist at runtime; [`validate_factory`] still
/// exercises every key at spawn as a startup check.
pub type StateFactory<K, C> = fn(K) -> BoxedState<K, C>;

/// Construct every key once. Called under `debug_assert!` at spawn so a
/// factory that panics for some key fails during setup, not mid-combat.
pub fn validate_factory<K: StateKey, C: 'static>(factory: StateFactory<K, C>) -> bool {
    for &key in K::ALL {
        let _ = factory(key);
    }
    true
}

/// The engine: current key, current state instance, and the factory.
pub struct StateMachine<K: StateKey, C: 'static> {
    current: K,
    state: BoxedState<K, C>,
    factory: StateFactory<K, C>,
}

impl<K: StateKey, C: 'static> StateMachine<K, C> {
    /// Set up the machine in `initial`, entering it directly without a
    /// transition check.
    pub fn new(initial: K, factory: StateFactory<K, C>, owner: &mut C) -> Self {
        debug_assert!(validate_factory(factory));

        let mut state = factory(initial);
        state.on_enter(owner);
        Self {
            current: initial,
            state,
            factory,
        }
    }

    pub fn current(&self) -> K {
        self.current
    }

    /// Advance one simulation tick: update, then transition check, then
    /// exit/construct/enter when the key changes.
    pub fn tick(&mut self, owner: &mut C) {
        self.state.on_update(owner);

        let next = self.state.check_transition(owner);
        if next == self.current {
            return;
        }

        self.state.on_exit(owner);
        let mut state = (self.factory)(next);
        state.on_enter(owner);
        self.state = state;
        self.current = next;
    }
}
