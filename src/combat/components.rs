//! Components and core resources shared across the combat systems.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{UnitArchetype, UnitRole};

/// Shared handle to the archetype a unit was spawned from.
#[derive(Component, Clone)]
pub struct ArchetypeRef(pub std::sync::Arc<UnitArchetype>);

/// One combatant. Spawned from an archetype entry; `id` is the
/// archetype id used for spawn lookups and log lines.
#[derive(Component, Debug)]
pub struct Unit {
    pub id: String,
    pub role: UnitRole,
    pub is_dead: bool,
    /// Current live target, refreshed every tick by target acquisition.
    pub target: Option<Entity>,
    /// Set by the damage resolver when a wounded boss decides to dodge;
    /// cleared by the brain when the transition is honored.
    pub evade_requested: bool,
    /// Cleared on death so corpses stop blocking projectiles.
    pub collidable: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

impl Unit {
    pub fn new(id: impl Into<String>, role: UnitRole) -> Self {
        Self {
            id: id.into(),
            role,
            is_dead: false,
            target: None,
            evade_requested: false,
            collidable: true,
            damage_dealt: 0.0,
            damage_taken: 0.0,
        }
    }
}

/// Desired velocity written by the brains, integrated by `apply_movement`.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Velocity(pub Vec2);

/// Boss special-attack charge. Filling it swaps the next post-attack
/// transition from Chasing to a pattern state.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PatternGauge {
    value: f32,
    max: f32,
    per_attack: f32,
}

impl PatternGauge {
    pub fn new(max: f32, per_attack: f32) -> Self {
        Self {
            value: 0.0,
            max,
            per_attack,
        }
    }

    /// Charge by the configured per-attack amount, clamped to `max`.
    pub fn add(&mut self) {
        self.value = (self.value + self.per_attack).min(self.max);
    }

    pub fn is_full(&self) -> bool {
        self.max > 0.0 && self.value >= self.max
    }

    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Stand-in for an animator: tracks whether the unit is moving and the
/// progress of the current attack swing. Brains read normalized attack
/// progress to time combo windows.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct AnimState {
    pub moving: bool,
    pub attack: Option<AttackAnim>,
    pub death_triggered: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct AttackAnim {
    pub elapsed: f32,
    pub secs: f32,
}

impl AnimState {
    pub fn start_attack(&mut self, secs: f32) {
        debug_assert!(secs > 0.0);
        self.attack = Some(AttackAnim { elapsed: 0.0, secs });
    }

    /// Normalized progress of the current attack swing. May exceed 1.0
    /// once the swing has run past its nominal length; 0.0 when no
    /// swing is active.
    pub fn attack_progress(&self) -> f32 {
        self.attack
            .map(|a| a.elapsed / a.secs)
            .unwrap_or(0.0)
    }
}

/// In-flight ranged attack. Carries the attacker's power at launch so
/// later stat changes don't retroactively alter the hit.
#[derive(Component, Debug)]
pub struct Projectile {
    pub attacker: Entity,
    pub power: f32,
    pub dir: Vec2,
    pub speed: f32,
    pub from_hostile: bool,
}

/// Removes the entity once the corpse-linger delay has elapsed.
#[derive(Component, Debug)]
pub struct DespawnTimer {
    pub remaining: f32,
}

/// Fixed simulation step. The whole simulation advances in equal slices
/// so seeded runs replay tick-for-tick.
#[derive(Resource, Clone, Copy, Debug)]
pub struct SimStep {
    pub dt: f32,
}

impl Default for SimStep {
    fn default() -> Self {
        Self { dt: 1.0 / 60.0 }
    }
}

/// Player intent for the current tick. Fed either by the autopilot or
/// by a scripted scenario; `attack_pressed` stays buffered until a
/// combo window consumes it.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct PlayerInput {
    pub move_input: Vec2,
    pub attack_pressed: bool,
    pub autopilot: bool,
}

/// Single RNG stream for all combat decisions. Seed it for reproducible
/// scenario runs; every parry, evade, and pattern draw consumes from
/// this stream in system order.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }

    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Uniform index in `[0, upper)`.
    pub fn random_index(&mut self, upper: usize) -> usize {
        debug_assert!(upper > 0);
        self.rng.gen_range(0..upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_clamps_and_reports_full() {
        let mut gauge = PatternGauge::new(100.0, 35.0);
        assert!(!gauge.is_full());
        gauge.add();
        gauge.add();
        assert_eq!(gauge.value(), 70.0);
        gauge.add();
        gauge.add();
        assert_eq!(gauge.value(), 100.0);
        assert!(gauge.is_full());
        gauge.reset();
        assert_eq!(gauge.value(), 0.0);
        assert!(!gauge.is_full());
    }

    #[test]
    fn zero_capacity_gauge_is_never_full() {
        let gauge = PatternGauge::default();
        assert!(!gauge.is_full());
    }

    #[test]
    fn seeded_rng_streams_match() {
        let mut a = GameRng::from_seed(42);
        let mut b = GameRng::from_seed(42);
        for _ in 0..32 {
            assert_eq!(a.random_f32(), b.random_f32());
        }
        assert_eq!(a.random_index(3), b.random_index(3));
    }

    #[test]
    fn attack_progress_tracks_elapsed() {
        let mut anim = AnimState::default();
        assert_eq!(anim.attack_progress(), 0.0);
        anim.start_attack(0.5);
        anim.attack.as_mut().unwrap().elapsed = 0.25;
        assert_eq!(anim.attack_progress(), 0.5);
    }
}
