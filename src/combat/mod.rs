//! Combat system
//!
//! Implements the simulation core:
//! - Unit components, stats, and the pattern gauge
//! - Strike resolution with parry and boss evade draws
//! - Projectile flight
//! - Combat logging

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod log;
pub mod projectiles;
pub mod resolve;

use components::{DespawnTimer, GameRng, SimStep};
use events::{DamageEvent, DeathEvent, StrikeEvent};
use log::CombatLog;

/// Melee wind-up before the strike lands.
pub const MELEE_WINDUP_SECS: f32 = 0.3;
/// Melee recovery after the strike, before the cooldown wait.
pub const MELEE_RECOVER_SECS: f32 = 0.2;
/// Extra reach the boss grants itself when closing to attack, so it
/// does not oscillate at the exact range boundary.
pub const BOSS_ATTACK_EPSILON: f32 = 0.1;
/// Health ratio below which a hit boss may decide to dodge.
pub const BOSS_EVADE_HP_RATIO: f32 = 0.6;
/// Chance of that dodge, drawn per qualifying hit.
pub const BOSS_EVADE_CHANCE: f32 = 0.25;
/// How long the boss dash away from its target lasts.
pub const EVADE_DURATION_SECS: f32 = 0.4;
/// Boss health ratios gating which pattern tiers can be drawn.
pub const PATTERN_HEALTHY_RATIO: f32 = 0.7;
pub const PATTERN_WOUNDED_RATIO: f32 = 0.45;
/// Ranged units close in until inside this fraction of attack range.
pub const RANGED_APPROACH_FACTOR: f32 = 0.8;
pub const PROJECTILE_HIT_RADIUS: f32 = 0.5;
/// Projectiles past this distance from the origin are discarded.
pub const ARENA_HALF_EXTENT: f32 = 50.0;
/// Corpse linger before despawn.
pub const ENEMY_DESPAWN_DELAY_SECS: f32 = 1.0;
pub const BOSS_DESPAWN_DELAY_SECS: f32 = 2.0;
pub const PLAYER_DESPAWN_DELAY_SECS: f32 = 2.0;

/// System set labels for simulation ordering.
///
/// Brains decide and emit strikes, resolution turns strikes into health
/// changes, cleanup removes expired corpses and projectiles' leftovers.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimPhase {
    Brains,
    Resolution,
    Cleanup,
}

/// Plugin for the combat simulation core.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<StrikeEvent>()
            .add_event::<DamageEvent>()
            .add_event::<DeathEvent>()
            .init_resource::<CombatLog>()
            .init_resource::<SimStep>()
            .init_resource::<components::PlayerInput>();

        if !app.world().contains_resource::<GameRng>() {
            app.init_resource::<GameRng>();
        }

        app.configure_sets(
            Update,
            (SimPhase::Brains, SimPhase::Resolution, SimPhase::Cleanup).chain(),
        );

        app.add_systems(
            Update,
            (
                advance_match_time,
                crate::brains::acquire_targets,
                crate::brains::player_autopilot,
                crate::brains::advance_animations,
                crate::brains::drive_player_brains,
                crate::brains::drive_enemy_brains,
                crate::brains::drive_boss_brains,
                crate::brains::apply_movement,
            )
                .chain()
                .in_set(SimPhase::Brains),
        );
        app.add_systems(
            Update,
            (
                projectiles::move_projectiles,
                resolve::resolve_strikes,
                resolve::record_combat_log,
            )
                .chain()
                .in_set(SimPhase::Resolution),
        );
        app.add_systems(Update, tick_despawn_timers.in_set(SimPhase::Cleanup));
    }
}

/// Advances the log's match clock by one fixed step.
pub fn advance_match_time(step: Res<SimStep>, mut log: ResMut<CombatLog>) {
    log.match_time += step.dt;
}

/// Removes entities whose corpse-linger delay has run out.
pub fn tick_despawn_timers(
    step: Res<SimStep>,
    mut commands: Commands,
    mut timers: Query<(Entity, &mut DespawnTimer)>,
) {
    for (entity, mut timer) in timers.iter_mut() {
        timer.remaining -= step.dt;
        if timer.remaining <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}
