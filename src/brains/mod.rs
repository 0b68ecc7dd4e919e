//! Brain drivers
//!
//! Bridges the state machine engine and the ECS. Each driver system
//! builds a tick context snapshot per unit, lends it to the unit's
//! machine, then writes the results back: velocity, flags, and the
//! queued actions (strikes, projectiles, animation triggers, despawns).

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::components::{
    AnimState, ArchetypeRef, GameRng, PatternGauge, PlayerInput, Projectile, SimStep, Unit,
    Velocity,
};
use crate::combat::events::StrikeEvent;
use crate::combat::log::CombatLog;
use crate::config::{UnitArchetype, UnitDefs, UnitRole};
use crate::fsm::StateMachine;
use crate::stats::StatSheet;

pub mod boss;
pub mod ctx;
pub mod enemy;
pub mod player;
pub mod sequence;

use boss::{boss_state_factory, BossState};
use ctx::{BrainCtx, PlayerCtx, StatView, TargetView, UnitAction};
use enemy::{enemy_state_factory, EnemyState};
use player::{player_state_factory, PlayerState};

#[derive(Component)]
pub struct EnemyBrain {
    pub machine: StateMachine<EnemyState, BrainCtx>,
}

#[derive(Component)]
pub struct BossBrain {
    pub machine: StateMachine<BossState, BrainCtx>,
}

#[derive(Component)]
pub struct PlayerBrain {
    pub machine: StateMachine<PlayerState, PlayerCtx>,
    /// Which combo step the next attack starts from.
    pub combo_index: usize,
}

/// Fraction of attack range inside which the autopilot stops and swings.
const AUTOPILOT_RANGE_FACTOR: f32 = 0.9;

/// Spawn a unit from its archetype entry, with its brain already
/// entered into Idle.
pub fn spawn_unit(
    commands: &mut Commands,
    defs: &UnitDefs,
    id: &str,
    pos: Vec2,
    rng: &mut GameRng,
) -> Result<Entity, String> {
    let archetype = defs
        .get(id)
        .ok_or_else(|| format!("unknown archetype '{}'", id))?
        .clone();
    let sheet = StatSheet::from_config(&archetype.stats)?;
    let stats = StatView::from_sheet(&sheet);

    let mut entity = commands.spawn((
        Transform::from_translation(pos.extend(0.0)),
        Unit::new(id, archetype.role),
        sheet,
        ArchetypeRef(archetype.clone()),
        AnimState::default(),
        Velocity::default(),
    ));

    match archetype.role {
        UnitRole::Player => {
            let mut ctx = PlayerCtx {
                dt: 0.0,
                pos,
                is_dead: false,
                move_input: Vec2::ZERO,
                attack_buffered: false,
                anim_progress: 0.0,
                combo_index: 0,
                target: None,
                stats,
                archetype,
                velocity: Vec2::ZERO,
                actions: SmallVec::new(),
            };
            let machine = StateMachine::new(PlayerState::Idle, player_state_factory, &mut ctx);
            entity.insert(PlayerBrain {
                machine,
                combo_index: 0,
            });
        }
        UnitRole::Boss => {
            let gauge = PatternGauge::new(archetype.gauge_max, archetype.gauge_per_attack);
            let mut ctx = brain_ctx_at_spawn(id, pos, stats, archetype, gauge, rng);
            let machine = StateMachine::new(BossState::Idle, boss_state_factory, &mut ctx);
            restore_rng(rng, &mut ctx);
            entity.insert((BossBrain { machine }, ctx.gauge));
        }
        UnitRole::MeleeMonster | UnitRole::RangedMonster => {
            let mut ctx =
                brain_ctx_at_spawn(id, pos, stats, archetype, PatternGauge::default(), rng);
            let machine = StateMachine::new(EnemyState::Idle, enemy_state_factory, &mut ctx);
            restore_rng(rng, &mut ctx);
            entity.insert(EnemyBrain { machine });
        }
    }

    Ok(entity.id())
}

fn brain_ctx_at_spawn(
    id: &str,
    pos: Vec2,
    stats: StatView,
    archetype: std::sync::Arc<UnitArchetype>,
    gauge: PatternGauge,
    rng: &mut GameRng,
) -> BrainCtx {
    BrainCtx {
        dt: 0.0,
        id: id.to_string(),
        pos,
        is_dead: false,
        evade_requested: false,
        target: None,
        stats,
        archetype,
        gauge,
        rng: take_rng(rng),
        velocity: Vec2::ZERO,
        actions: SmallVec::new(),
    }
}

/// Borrow the shared stream for the duration of a tick. The placeholder
/// left behind is never drawn from.
fn take_rng(rng: &mut GameRng) -> GameRng {
    std::mem::replace(rng, GameRng::from_seed(0))
}

fn restore_rng(rng: &mut GameRng, ctx: &mut BrainCtx) {
    *rng = std::mem::replace(&mut ctx.rng, GameRng::from_seed(0));
}

/// Refresh every unit's target to a live opponent: hostiles fight the
/// player, the player fights the nearest live hostile.
pub fn acquire_targets(mut units: Query<(Entity, &Transform, &mut Unit)>) {
    let snapshot: Vec<(Entity, Vec2, bool, bool)> = units
        .iter()
        .map(|(e, tf, u)| (e, tf.translation.truncate(), u.role.is_hostile(), u.is_dead))
        .collect();

    for (entity, tf, mut unit) in units.iter_mut() {
        if unit.is_dead {
            unit.target = None;
            continue;
        }
        // Keep the current target while it lives.
        if let Some(current) = unit.target {
            if snapshot
                .iter()
                .any(|(e, _, _, dead)| *e == current && !dead)
            {
                continue;
            }
        }

        let pos = tf.translation.truncate();
        let hostile = unit.role.is_hostile();
        unit.target = snapshot
            .iter()
            .filter(|(e, _, h, dead)| *e != entity && *h != hostile && !dead)
            .min_by(|a, b| {
                pos.distance_squared(a.1)
                    .partial_cmp(&pos.distance_squared(b.1))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(e, _, _, _)| *e);
    }
}

/// Scripted stand-in for a human: walk at the current target and mash
/// attack once in range. Only runs when the scenario enables it.
pub fn player_autopilot(
    mut input: ResMut<PlayerInput>,
    players: Query<(&Transform, &Unit, &StatSheet), With<PlayerBrain>>,
    positions: Query<&Transform>,
) {
    if !input.autopilot {
        return;
    }
    let Ok((tf, unit, sheet)) = players.get_single() else {
        input.move_input = Vec2::ZERO;
        return;
    };
    if unit.is_dead {
        input.move_input = Vec2::ZERO;
        input.attack_pressed = false;
        return;
    }
    let target_pos = unit
        .target
        .and_then(|e| positions.get(e).ok())
        .map(|t| t.translation.truncate());
    let Some(target_pos) = target_pos else {
        input.move_input = Vec2::ZERO;
        return;
    };

    let to_target = target_pos - tf.translation.truncate();
    let range = StatView::from_sheet(sheet).attack_range;
    if to_target.length() <= range * AUTOPILOT_RANGE_FACTOR {
        input.move_input = Vec2::ZERO;
        input.attack_pressed = true;
    } else {
        input.move_input = to_target.normalize_or_zero();
    }
}

/// Advance active attack swings by one fixed step.
pub fn advance_animations(step: Res<SimStep>, mut anims: Query<&mut AnimState>) {
    for mut anim in anims.iter_mut() {
        if let Some(attack) = anim.attack.as_mut() {
            attack.elapsed += step.dt;
        }
    }
}

pub fn drive_enemy_brains(
    step: Res<SimStep>,
    mut commands: Commands,
    mut rng: ResMut<GameRng>,
    mut log: ResMut<CombatLog>,
    mut strikes: EventWriter<StrikeEvent>,
    mut units: Query<(
        Entity,
        &Transform,
        &mut Unit,
        &StatSheet,
        &ArchetypeRef,
        &mut AnimState,
        &mut Velocity,
        &mut EnemyBrain,
    )>,
    positions: Query<&Transform>,
) {
    for (entity, tf, mut unit, sheet, archetype, mut anim, mut vel, mut brain) in units.iter_mut()
    {
        let target = target_view(unit.target, &positions);
        let mut brain_ctx = BrainCtx {
            dt: step.dt,
            id: unit.id.clone(),
            pos: tf.translation.truncate(),
            is_dead: unit.is_dead,
            evade_requested: unit.evade_requested,
            target,
            stats: StatView::from_sheet(sheet),
            archetype: archetype.0.clone(),
            gauge: PatternGauge::default(),
            rng: take_rng(&mut rng),
            velocity: vel.0,
            actions: SmallVec::new(),
        };

        brain.machine.tick(&mut brain_ctx);

        restore_rng(&mut rng, &mut brain_ctx);
        unit.evade_requested = brain_ctx.evade_requested;
        vel.0 = brain_ctx.velocity;
        apply_actions(
            entity,
            &mut unit,
            &mut anim,
            brain_ctx.pos,
            &brain_ctx.stats,
            &archetype.0,
            target,
            brain_ctx.actions,
            &mut commands,
            &mut strikes,
            &mut log,
        );
    }
}

pub fn drive_boss_brains(
    step: Res<SimStep>,
    mut commands: Commands,
    mut rng: ResMut<GameRng>,
    mut log: ResMut<CombatLog>,
    mut strikes: EventWriter<StrikeEvent>,
    mut units: Query<(
        Entity,
        &Transform,
        &mut Unit,
        &StatSheet,
        &ArchetypeRef,
        &mut AnimState,
        &mut Velocity,
        &mut PatternGauge,
        &mut BossBrain,
    )>,
    positions: Query<&Transform>,
) {
    for (entity, tf, mut unit, sheet, archetype, mut anim, mut vel, mut gauge, mut brain) in
        units.iter_mut()
    {
        let target = target_view(unit.target, &positions);
        let mut brain_ctx = BrainCtx {
            dt: step.dt,
            id: unit.id.clone(),
            pos: tf.translation.truncate(),
            is_dead: unit.is_dead,
            evade_requested: unit.evade_requested,
            target,
            stats: StatView::from_sheet(sheet),
            archetype: archetype.0.clone(),
            gauge: *gauge,
            rng: take_rng(&mut rng),
            velocity: vel.0,
            actions: SmallVec::new(),
        };

        brain.machine.tick(&mut brain_ctx);

        restore_rng(&mut rng, &mut brain_ctx);
        unit.evade_requested = brain_ctx.evade_requested;
        *gauge = brain_ctx.gauge;
        vel.0 = brain_ctx.velocity;
        apply_actions(
            entity,
            &mut unit,
            &mut anim,
            brain_ctx.pos,
            &brain_ctx.stats,
            &archetype.0,
            target,
            brain_ctx.actions,
            &mut commands,
            &mut strikes,
            &mut log,
        );
    }
}

pub fn drive_player_brains(
    step: Res<SimStep>,
    mut commands: Commands,
    mut input: ResMut<PlayerInput>,
    mut log: ResMut<CombatLog>,
    mut strikes: EventWriter<StrikeEvent>,
    mut units: Query<(
        Entity,
        &Transform,
        &mut Unit,
        &StatSheet,
        &ArchetypeRef,
        &mut AnimState,
        &mut Velocity,
        &mut PlayerBrain,
    )>,
    positions: Query<&Transform, Without<PlayerBrain>>,
) {
    for (entity, tf, mut unit, sheet, archetype, mut anim, mut vel, mut brain) in units.iter_mut()
    {
        let target = target_view(unit.target, &positions);
        let mut player_ctx = PlayerCtx {
            dt: step.dt,
            pos: tf.translation.truncate(),
            is_dead: unit.is_dead,
            move_input: input.move_input,
            attack_buffered: input.attack_pressed,
            anim_progress: anim.attack_progress(),
            combo_index: brain.combo_index,
            target,
            stats: StatView::from_sheet(sheet),
            archetype: archetype.0.clone(),
            velocity: vel.0,
            actions: SmallVec::new(),
        };

        brain.machine.tick(&mut player_ctx);

        input.attack_pressed = player_ctx.attack_buffered;
        brain.combo_index = player_ctx.combo_index;
        vel.0 = player_ctx.velocity;
        apply_actions(
            entity,
            &mut unit,
            &mut anim,
            player_ctx.pos,
            &player_ctx.stats,
            &archetype.0,
            target,
            player_ctx.actions,
            &mut commands,
            &mut strikes,
            &mut log,
        );
    }
}

/// Integrate brain-written velocities into positions.
pub fn apply_movement(step: Res<SimStep>, mut movers: Query<(&mut Transform, &Velocity)>) {
    for (mut tf, vel) in movers.iter_mut() {
        tf.translation += (vel.0 * step.dt).extend(0.0);
    }
}

fn target_view<F: bevy::ecs::query::QueryFilter>(
    target: Option<Entity>,
    positions: &Query<&Transform, F>,
) -> Option<TargetView> {
    let entity = target?;
    let tf = positions.get(entity).ok()?;
    Some(TargetView {
        entity,
        pos: tf.translation.truncate(),
    })
}

#[allow(clippy::too_many_arguments)]
fn apply_actions(
    entity: Entity,
    unit: &mut Unit,
    anim: &mut AnimState,
    pos: Vec2,
    stats: &StatView,
    archetype: &UnitArchetype,
    target: Option<TargetView>,
    actions: SmallVec<[UnitAction; 4]>,
    commands: &mut Commands,
    strikes: &mut EventWriter<StrikeEvent>,
    log: &mut CombatLog,
) {
    for action in actions {
        match action {
            UnitAction::Strike { bonus_damage } => {
                // The target can vanish during the wind-up; the swing whiffs.
                let Some(t) = target else { continue };
                strikes.send(StrikeEvent {
                    attacker: entity,
                    defender: t.entity,
                    power: stats.attack_power + bonus_damage,
                });
            }
            UnitAction::SpawnProjectile => {
                let Some(t) = target else { continue };
                let dir = (t.pos - pos).normalize_or_zero();
                if dir == Vec2::ZERO {
                    continue;
                }
                commands.spawn((
                    Transform::from_translation(pos.extend(0.0)),
                    Projectile {
                        attacker: entity,
                        power: stats.attack_power,
                        dir,
                        speed: archetype.projectile_speed,
                        from_hostile: unit.role.is_hostile(),
                    },
                ));
            }
            UnitAction::SetMoving(moving) => anim.moving = moving,
            UnitAction::TriggerAttackAnim { secs } => anim.start_attack(secs),
            UnitAction::TriggerDeathAnim => anim.death_triggered = true,
            UnitAction::DisableCollision => unit.collidable = false,
            UnitAction::RequestDespawn { delay } => {
                commands
                    .entity(entity)
                    .insert(crate::combat::components::DespawnTimer { remaining: delay });
            }
            UnitAction::Announce { kind, message } => log.log(kind, message),
        }
    }
}
