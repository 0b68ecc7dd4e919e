//! Combat events
//!
//! Events flowing between the brain systems and the damage resolver.

use bevy::prelude::*;

/// A landed hit awaiting resolution. Emitted when a melee swing
/// connects or a projectile reaches its target; `power` is the
/// attacker's attack power captured at the instant of the strike.
#[derive(Event, Debug, Clone, Copy)]
pub struct StrikeEvent {
    pub attacker: Entity,
    pub defender: Entity,
    pub power: f32,
}

/// Outcome of one resolved strike, fired whether or not health changed.
#[derive(Event, Debug, Clone, Copy)]
pub struct DamageEvent {
    pub attacker: Entity,
    pub defender: Entity,
    /// Damage actually applied; 0.0 for a parried hit.
    pub amount: f32,
    pub parried: bool,
    /// Whether this hit made a wounded boss decide to dodge.
    pub evade_triggered: bool,
    pub remaining_health: f32,
}

/// Fired exactly once per unit, on the strike that kills it.
#[derive(Event, Debug, Clone, Copy)]
pub struct DeathEvent {
    pub victim: Entity,
    pub killer: Entity,
}
