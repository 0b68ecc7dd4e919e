//! Projectile flight and impact
//!
//! Ranged attacks spawn a projectile entity at launch; from then on the
//! shot is independent of its attacker. On impact it feeds the same
//! strike pipeline as a melee hit.

use bevy::prelude::*;

use super::components::{Projectile, SimStep, Unit};
use super::events::StrikeEvent;
use super::{ARENA_HALF_EXTENT, PROJECTILE_HIT_RADIUS};

/// Advance every projectile, despawn the ones that left the arena, and
/// convert impacts into strikes.
pub fn move_projectiles(
    step: Res<SimStep>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Transform, &Projectile), Without<Unit>>,
    units: Query<(Entity, &Transform, &Unit), Without<Projectile>>,
    mut strikes: EventWriter<StrikeEvent>,
) {
    for (proj_entity, mut transform, projectile) in projectiles.iter_mut() {
        let delta = projectile.dir * projectile.speed * step.dt;
        transform.translation += delta.extend(0.0);
        let pos = transform.translation.truncate();

        if pos.x.abs() > ARENA_HALF_EXTENT || pos.y.abs() > ARENA_HALF_EXTENT {
            commands.entity(proj_entity).despawn();
            continue;
        }

        // First opposing live unit within the hit radius absorbs the shot.
        let hit = units.iter().find(|(_, unit_tf, unit)| {
            unit.role.is_hostile() != projectile.from_hostile
                && !unit.is_dead
                && unit.collidable
                && unit_tf.translation.truncate().distance(pos) <= PROJECTILE_HIT_RADIUS
        });

        if let Some((defender, _, _)) = hit {
            strikes.send(StrikeEvent {
                attacker: projectile.attacker,
                defender,
                power: projectile.power,
            });
            commands.entity(proj_entity).despawn();
        }
    }
}
