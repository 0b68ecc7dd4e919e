//! Regular monster behavior: Idle, Chasing, Attack, Die.
//!
//! Melee and ranged monsters share this graph; the ranged variant
//! differs in how Chasing positions (stand-off band instead of a
//! straight pursuit) and in what the strike instant emits.

use crate::combat::{
    ENEMY_DESPAWN_DELAY_SECS, MELEE_RECOVER_SECS, MELEE_WINDUP_SECS, RANGED_APPROACH_FACTOR,
};
use crate::config::UnitRole;
use crate::fsm::{BoxedState, State, StateKey};

use super::ctx::{BrainCtx, UnitAction};
use super::sequence::AttackSequence;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnemyState {
    Idle,
    Chasing,
    Attack,
    Die,
}

impl StateKey for EnemyState {
    const ALL: &'static [Self] = &[
        EnemyState::Idle,
        EnemyState::Chasing,
        EnemyState::Attack,
        EnemyState::Die,
    ];
}

pub fn enemy_state_factory(key: EnemyState) -> BoxedState<EnemyState, BrainCtx> {
    match key {
        EnemyState::Idle => Box::new(IdleState),
        EnemyState::Chasing => Box::new(ChasingState),
        EnemyState::Attack => Box::new(AttackState::new()),
        EnemyState::Die => Box::new(DieState),
    }
}

struct IdleState;

impl State<EnemyState, BrainCtx> for IdleState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));
    }

    fn check_transition(&mut self, owner: &mut BrainCtx) -> EnemyState {
        if owner.is_dead {
            return EnemyState::Die;
        }
        match owner.distance_to_target() {
            Some(dist) if dist <= owner.archetype.detection_range => EnemyState::Chasing,
            _ => EnemyState::Idle,
        }
    }
}

struct ChasingState;

impl ChasingState {
    /// Whether the unit is positioned to swing at its target.
    fn in_attack_position(owner: &BrainCtx, dist: f32) -> bool {
        dist <= owner.stats.attack_range && dist >= owner.archetype.min_attack_distance
    }
}

impl State<EnemyState, BrainCtx> for ChasingState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.push(UnitAction::SetMoving(true));
    }

    fn on_update(&mut self, owner: &mut BrainCtx) {
        let (Some(dist), Some(dir)) = (owner.distance_to_target(), owner.dir_to_target()) else {
            owner.halt();
            return;
        };
        let speed = owner.stats.move_speed;

        owner.velocity = match owner.archetype.role {
            UnitRole::RangedMonster => {
                // Hold a stand-off band: retreat when crowded, advance
                // until comfortably inside range, otherwise hold.
                if dist < owner.archetype.min_attack_distance {
                    -dir * speed
                } else if dist > owner.stats.attack_range * RANGED_APPROACH_FACTOR {
                    dir * speed
                } else {
                    bevy::math::Vec2::ZERO
                }
            }
            _ => dir * speed,
        };
    }

    fn check_transition(&mut self, owner: &mut BrainCtx) -> EnemyState {
        if owner.is_dead {
            return EnemyState::Die;
        }
        let Some(dist) = owner.distance_to_target() else {
            return EnemyState::Idle;
        };
        if Self::in_attack_position(owner, dist) {
            EnemyState::Attack
        } else {
            EnemyState::Chasing
        }
    }
}

/// Runs one full swing: wind-up, strike, recovery, cooldown. The
/// sequence is not interruptible except by death; leaving the state
/// drops it, so no strike can land after a cancel.
struct AttackState {
    seq: Option<AttackSequence>,
}

impl AttackState {
    fn new() -> Self {
        Self { seq: None }
    }
}

impl State<EnemyState, BrainCtx> for AttackState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));

        let cooldown = 1.0 / owner.stats.attack_speed;
        let total = MELEE_WINDUP_SECS + MELEE_RECOVER_SECS;
        owner.push(UnitAction::TriggerAttackAnim { secs: total });
        self.seq = Some(AttackSequence::new(
            MELEE_WINDUP_SECS,
            MELEE_RECOVER_SECS,
            cooldown,
        ));
    }

    fn on_update(&mut self, owner: &mut BrainCtx) {
        let Some(seq) = self.seq.as_mut() else { return };
        if seq.tick(owner.dt) {
            let action = match owner.archetype.role {
                UnitRole::RangedMonster => UnitAction::SpawnProjectile,
                _ => UnitAction::Strike { bonus_damage: 0.0 },
            };
            owner.push(action);
        }
    }

    fn check_transition(&mut self, owner: &mut BrainCtx) -> EnemyState {
        if owner.is_dead {
            return EnemyState::Die;
        }
        match &self.seq {
            Some(seq) if seq.is_done() => EnemyState::Chasing,
            _ => EnemyState::Attack,
        }
    }
}

/// Terminal. Side effects run in `on_enter`, which fires exactly once
/// because nothing transitions out of Die.
pub(super) struct DieState;

impl State<EnemyState, BrainCtx> for DieState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));
        owner.push(UnitAction::DisableCollision);
        owner.push(UnitAction::TriggerDeathAnim);
        owner.push(UnitAction::RequestDespawn {
            delay: ENEMY_DESPAWN_DELAY_SECS,
        });
    }

    fn check_transition(&mut self, _owner: &mut BrainCtx) -> EnemyState {
        EnemyState::Die
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::components::{GameRng, PatternGauge};
    use crate::config::UnitArchetype;
    use crate::fsm::StateMachine;
    use bevy::prelude::{Entity, Vec2};
    use smallvec::SmallVec;
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::super::ctx::{StatView, TargetView};

    fn archetype(role: UnitRole) -> Arc<UnitArchetype> {
        Arc::new(UnitArchetype {
            name: "fixture".to_string(),
            role,
            stats: HashMap::new(),
            detection_range: 8.0,
            parry_chance: 0.0,
            attack_cooldown: 0.0,
            min_attack_distance: if role == UnitRole::RangedMonster {
                3.0
            } else {
                0.0
            },
            projectile_speed: 14.0,
            pattern_delays: Vec::new(),
            gauge_max: 0.0,
            gauge_per_attack: 0.0,
            combo: Vec::new(),
        })
    }

    fn ctx_at(archetype: Arc<UnitArchetype>, dist: f32) -> BrainCtx {
        BrainCtx {
            dt: 0.05,
            id: "grunt".to_string(),
            pos: Vec2::ZERO,
            is_dead: false,
            evade_requested: false,
            target: Some(TargetView {
                entity: Entity::from_raw(1),
                pos: Vec2::new(dist, 0.0),
            }),
            stats: StatView {
                move_speed: 3.0,
                attack_power: 5.0,
                attack_speed: 1.0,
                attack_range: 6.0,
                dash_force: 7.5,
                health_cur: 30.0,
                health_max: 30.0,
            },
            archetype,
            gauge: PatternGauge::default(),
            rng: GameRng::from_seed(7),
            velocity: Vec2::ZERO,
            actions: SmallVec::new(),
        }
    }

    fn strikes(owner: &BrainCtx) -> usize {
        owner
            .actions
            .iter()
            .filter(|a| matches!(a, UnitAction::Strike { .. } | UnitAction::SpawnProjectile))
            .count()
    }

    #[test]
    fn idle_notices_targets_at_detection_range() {
        let arch = archetype(UnitRole::MeleeMonster);

        let mut owner = ctx_at(arch.clone(), 8.0);
        let mut machine = StateMachine::new(EnemyState::Idle, enemy_state_factory, &mut owner);
        machine.tick(&mut owner);
        assert_eq!(machine.current(), EnemyState::Chasing);

        let mut owner = ctx_at(arch, 8.5);
        let mut machine = StateMachine::new(EnemyState::Idle, enemy_state_factory, &mut owner);
        machine.tick(&mut owner);
        assert_eq!(machine.current(), EnemyState::Idle);
    }

    #[test]
    fn attack_strikes_once_then_returns_to_chasing() {
        let arch = archetype(UnitRole::MeleeMonster);
        let mut owner = ctx_at(arch, 5.0);
        let mut machine = StateMachine::new(EnemyState::Idle, enemy_state_factory, &mut owner);

        // Idle -> Chasing -> Attack (target already inside attack range).
        machine.tick(&mut owner);
        machine.tick(&mut owner);
        assert_eq!(machine.current(), EnemyState::Attack);

        // One full swing: wind-up 0.3s, recover 0.2s, cooldown 1s.
        let mut total_strikes = 0;
        let mut ticks = 0;
        while machine.current() == EnemyState::Attack && ticks < 60 {
            owner.actions.clear();
            machine.tick(&mut owner);
            total_strikes += strikes(&owner);
            ticks += 1;
        }
        assert_eq!(machine.current(), EnemyState::Chasing);
        assert_eq!(total_strikes, 1);
        assert!(ticks >= 28, "swing finished suspiciously fast: {} ticks", ticks);
    }

    #[test]
    fn death_interrupts_a_pending_swing() {
        let arch = archetype(UnitRole::MeleeMonster);
        let mut owner = ctx_at(arch, 5.0);
        let mut machine = StateMachine::new(EnemyState::Idle, enemy_state_factory, &mut owner);
        machine.tick(&mut owner);
        machine.tick(&mut owner);
        assert_eq!(machine.current(), EnemyState::Attack);

        // Two ticks in, the wind-up has not fired yet.
        owner.actions.clear();
        machine.tick(&mut owner);
        machine.tick(&mut owner);
        assert_eq!(strikes(&owner), 0);

        owner.is_dead = true;
        owner.actions.clear();
        machine.tick(&mut owner);
        assert_eq!(machine.current(), EnemyState::Die);
        assert!(owner
            .actions
            .iter()
            .any(|a| matches!(a, UnitAction::RequestDespawn { .. })));
        assert!(owner
            .actions
            .iter()
            .any(|a| matches!(a, UnitAction::DisableCollision)));

        // The dropped sequence can never deliver its strike.
        for _ in 0..40 {
            owner.actions.clear();
            machine.tick(&mut owner);
            assert_eq!(strikes(&owner), 0);
        }
    }

    #[test]
    fn ranged_chasing_holds_a_standoff_band() {
        let arch = archetype(UnitRole::RangedMonster);
        let mut chasing = ChasingState;

        // Too close (inside min 3.0): back away.
        let mut owner = ctx_at(arch.clone(), 2.0);
        chasing.on_update(&mut owner);
        assert!(owner.velocity.x < 0.0);

        // Too far (past 80% of range 6.0): advance.
        let mut owner = ctx_at(arch.clone(), 5.5);
        chasing.on_update(&mut owner);
        assert!(owner.velocity.x > 0.0);

        // Inside the band: hold position.
        let mut owner = ctx_at(arch, 4.0);
        owner.velocity = Vec2::X;
        chasing.on_update(&mut owner);
        assert_eq!(owner.velocity, Vec2::ZERO);
    }
}
