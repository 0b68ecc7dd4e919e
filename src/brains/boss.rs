//! Boss behavior: the monster graph plus a charge gauge, three pattern
//! tiers gated by remaining health, and a damage-triggered evade dash.

use bevy::math::Vec2;

use crate::combat::log::CombatLogEventType;
use crate::combat::{
    BOSS_ATTACK_EPSILON, BOSS_DESPAWN_DELAY_SECS, EVADE_DURATION_SECS, PATTERN_HEALTHY_RATIO,
    PATTERN_WOUNDED_RATIO,
};
use crate::fsm::{BoxedState, State, StateKey};

use super::ctx::{BrainCtx, UnitAction};
use super::sequence::AttackSequence;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BossState {
    Idle,
    Chasing,
    Attack,
    Pattern1,
    Pattern2,
    Pattern3,
    Evade,
    Die,
}

impl StateKey for BossState {
    const ALL: &'static [Self] = &[
        BossState::Idle,
        BossState::Chasing,
        BossState::Attack,
        BossState::Pattern1,
        BossState::Pattern2,
        BossState::Pattern3,
        BossState::Evade,
        BossState::Die,
    ];
}

impl BossState {
    fn pattern(tier: usize) -> BossState {
        match tier {
            0 => BossState::Pattern1,
            1 => BossState::Pattern2,
            _ => BossState::Pattern3,
        }
    }
}

pub fn boss_state_factory(key: BossState) -> BoxedState<BossState, BrainCtx> {
    match key {
        BossState::Idle => Box::new(IdleState),
        BossState::Chasing => Box::new(ChasingState),
        BossState::Attack => Box::new(AttackState::new()),
        BossState::Pattern1 => Box::new(PatternState::new(0)),
        BossState::Pattern2 => Box::new(PatternState::new(1)),
        BossState::Pattern3 => Box::new(PatternState::new(2)),
        BossState::Evade => Box::new(EvadeState::new()),
        BossState::Die => Box::new(DieState),
    }
}

/// Which pattern tiers are available at the boss's current health: the
/// draw ceiling grows as health drops. At or above the healthy ratio
/// only tier 1 exists; below the wounded ratio all three do.
pub fn pattern_tier_ceiling(hp_ratio: f32) -> usize {
    if hp_ratio >= PATTERN_HEALTHY_RATIO {
        1
    } else if hp_ratio >= PATTERN_WOUNDED_RATIO {
        2
    } else {
        3
    }
}

/// Death first, then a pending evade request. Shared by every
/// non-terminal state's transition check.
fn interrupt(owner: &mut BrainCtx) -> Option<BossState> {
    if owner.is_dead {
        return Some(BossState::Die);
    }
    if owner.evade_requested {
        owner.evade_requested = false;
        return Some(BossState::Evade);
    }
    None
}

struct IdleState;

impl State<BossState, BrainCtx> for IdleState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));
    }

    fn check_transition(&mut self, owner: &mut BrainCtx) -> BossState {
        if let Some(next) = interrupt(owner) {
            return next;
        }
        match owner.distance_to_target() {
            Some(dist) if dist <= owner.archetype.detection_range => BossState::Chasing,
            _ => BossState::Idle,
        }
    }
}

struct ChasingState;

impl State<BossState, BrainCtx> for ChasingState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.push(UnitAction::SetMoving(true));
    }

    fn on_update(&mut self, owner: &mut BrainCtx) {
        match owner.dir_to_target() {
            Some(dir) => owner.velocity = dir * owner.stats.move_speed,
            None => owner.halt(),
        }
    }

    fn check_transition(&mut self, owner: &mut BrainCtx) -> BossState {
        if let Some(next) = interrupt(owner) {
            return next;
        }
        let Some(dist) = owner.distance_to_target() else {
            return BossState::Idle;
        };
        // The epsilon keeps the boss from dithering at the exact edge.
        if dist <= owner.stats.attack_range + BOSS_ATTACK_EPSILON {
            BossState::Attack
        } else {
            BossState::Chasing
        }
    }
}

/// One boss swing. Wind-up scales with attack speed; the strike also
/// charges the pattern gauge, and a full gauge redirects the
/// post-attack transition into a pattern draw.
struct AttackState {
    seq: Option<AttackSequence>,
}

impl AttackState {
    fn new() -> Self {
        Self { seq: None }
    }
}

impl State<BossState, BrainCtx> for AttackState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));

        let wind_up = 1.0 / owner.stats.attack_speed;
        let cooldown = owner.archetype.attack_cooldown;
        owner.push(UnitAction::TriggerAttackAnim { secs: wind_up });
        // Recovery is folded into the configured cooldown for bosses.
        self.seq = Some(AttackSequence::new(wind_up, 0.0, cooldown));
    }

    fn on_update(&mut self, owner: &mut BrainCtx) {
        let Some(seq) = self.seq.as_mut() else { return };
        if seq.tick(owner.dt) {
            owner.push(UnitAction::Strike { bonus_damage: 0.0 });
            owner.gauge.add();
        }
    }

    fn check_transition(&mut self, owner: &mut BrainCtx) -> BossState {
        // An evade request cancels the swing: exiting drops the
        // sequence, so a cancelled wind-up never lands its strike.
        if let Some(next) = interrupt(owner) {
            return next;
        }
        match &self.seq {
            Some(seq) if seq.is_done() => {}
            _ => return BossState::Attack,
        }
        if !owner.gauge.is_full() {
            return BossState::Chasing;
        }

        owner.gauge.reset();
        let ceiling = pattern_tier_ceiling(owner.stats.hp_ratio());
        let tier = owner.rng.random_index(ceiling);
        BossState::pattern(tier)
    }
}

/// Occupies the boss for the configured tier delay. The special attack
/// itself is presentation; the behavioral contract is the lockout.
struct PatternState {
    tier: usize,
    elapsed: f32,
}

impl PatternState {
    fn new(tier: usize) -> Self {
        Self { tier, elapsed: 0.0 }
    }
}

impl State<BossState, BrainCtx> for PatternState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));
        owner.push(UnitAction::Announce {
            kind: CombatLogEventType::Pattern,
            message: format!("{} unleashes pattern {}", owner.id, self.tier + 1),
        });
    }

    fn on_update(&mut self, owner: &mut BrainCtx) {
        self.elapsed += owner.dt;
    }

    fn check_transition(&mut self, owner: &mut BrainCtx) -> BossState {
        if let Some(next) = interrupt(owner) {
            return next;
        }
        let delay = owner
            .archetype
            .pattern_delays
            .get(self.tier)
            .copied()
            .unwrap_or(0.0);
        if self.elapsed >= delay {
            BossState::Chasing
        } else {
            BossState::pattern(self.tier)
        }
    }
}

/// Short dash away from the target at dash force.
struct EvadeState {
    elapsed: f32,
}

impl EvadeState {
    fn new() -> Self {
        Self { elapsed: 0.0 }
    }
}

impl State<BossState, BrainCtx> for EvadeState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.push(UnitAction::SetMoving(true));
    }

    fn on_update(&mut self, owner: &mut BrainCtx) {
        self.elapsed += owner.dt;
        let away = match owner.dir_to_target() {
            Some(dir) if dir != Vec2::ZERO => -dir,
            _ => Vec2::X,
        };
        owner.velocity = away * owner.stats.dash_force;
    }

    fn check_transition(&mut self, owner: &mut BrainCtx) -> BossState {
        if owner.is_dead {
            return BossState::Die;
        }
        if self.elapsed >= EVADE_DURATION_SECS {
            BossState::Chasing
        } else {
            BossState::Evade
        }
    }
}

struct DieState;

impl State<BossState, BrainCtx> for DieState {
    fn on_enter(&mut self, owner: &mut BrainCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));
        owner.push(UnitAction::DisableCollision);
        owner.push(UnitAction::TriggerDeathAnim);
        owner.push(UnitAction::RequestDespawn {
            delay: BOSS_DESPAWN_DELAY_SECS,
        });
    }

    fn check_transition(&mut self, _owner: &mut BrainCtx) -> BossState {
        BossState::Die
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::components::{GameRng, PatternGauge};
    use crate::config::{UnitArchetype, UnitRole};
    use crate::fsm::StateMachine;
    use bevy::prelude::Entity;
    use smallvec::SmallVec;
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::super::ctx::{StatView, TargetView};

    #[test]
    fn tier_ceiling_follows_health() {
        assert_eq!(pattern_tier_ceiling(1.0), 1);
        assert_eq!(pattern_tier_ceiling(0.7), 1);
        assert_eq!(pattern_tier_ceiling(0.69), 2);
        assert_eq!(pattern_tier_ceiling(0.45), 2);
        assert_eq!(pattern_tier_ceiling(0.44), 3);
        assert_eq!(pattern_tier_ceiling(0.0), 3);
    }

    fn boss_ctx() -> BrainCtx {
        let archetype = Arc::new(UnitArchetype {
            name: "Warden".to_string(),
            role: UnitRole::Boss,
            stats: HashMap::new(),
            detection_range: 25.0,
            parry_chance: 0.0,
            attack_cooldown: 0.5,
            min_attack_distance: 0.0,
            projectile_speed: 0.0,
            pattern_delays: vec![0.2, 0.2, 0.2],
            gauge_max: 10.0,
            gauge_per_attack: 10.0,
            combo: Vec::new(),
        });
        BrainCtx {
            dt: 0.05,
            id: "warden".to_string(),
            pos: Vec2::ZERO,
            is_dead: false,
            evade_requested: false,
            target: Some(TargetView {
                entity: Entity::from_raw(1),
                pos: Vec2::new(1.0, 0.0),
            }),
            stats: StatView {
                move_speed: 2.5,
                attack_power: 8.0,
                attack_speed: 1.0,
                attack_range: 1.8,
                dash_force: 10.0,
                health_cur: 100.0,
                health_max: 100.0,
            },
            archetype,
            // One strike fills the gauge.
            gauge: PatternGauge::new(10.0, 10.0),
            rng: GameRng::from_seed(1),
            velocity: Vec2::ZERO,
            actions: SmallVec::new(),
        }
    }

    fn strikes(owner: &BrainCtx) -> usize {
        owner
            .actions
            .iter()
            .filter(|a| matches!(a, UnitAction::Strike { .. }))
            .count()
    }

    fn enter_attack(owner: &mut BrainCtx) -> StateMachine<BossState, BrainCtx> {
        let mut machine = StateMachine::new(BossState::Idle, boss_state_factory, owner);
        machine.tick(owner);
        machine.tick(owner);
        assert_eq!(machine.current(), BossState::Attack);
        machine
    }

    #[test]
    fn full_gauge_redirects_into_a_pattern() {
        let mut owner = boss_ctx();
        let mut machine = enter_attack(&mut owner);

        let mut total_strikes = 0;
        let mut ticks = 0;
        while machine.current() == BossState::Attack && ticks < 80 {
            owner.actions.clear();
            machine.tick(&mut owner);
            total_strikes += strikes(&owner);
            ticks += 1;
        }

        assert_eq!(total_strikes, 1);
        // Full health draws from a ceiling of one tier.
        assert_eq!(machine.current(), BossState::Pattern1);
        assert_eq!(owner.gauge.value(), 0.0);
        assert!(owner.actions.iter().any(|a| matches!(
            a,
            UnitAction::Announce {
                kind: CombatLogEventType::Pattern,
                ..
            }
        )));

        // The pattern occupies the boss for its tier delay, then releases.
        let mut ticks = 0;
        while machine.current() == BossState::Pattern1 && ticks < 20 {
            owner.actions.clear();
            machine.tick(&mut owner);
            ticks += 1;
        }
        assert_eq!(machine.current(), BossState::Chasing);
    }

    #[test]
    fn evade_request_cancels_the_swing_at_the_next_check() {
        let mut owner = boss_ctx();
        let mut machine = enter_attack(&mut owner);

        // One tick into the wind-up, a hit requests the dodge.
        owner.actions.clear();
        machine.tick(&mut owner);
        assert_eq!(strikes(&owner), 0);
        owner.evade_requested = true;

        owner.actions.clear();
        machine.tick(&mut owner);
        assert_eq!(machine.current(), BossState::Evade);
        assert!(!owner.evade_requested);
        // The cancelled wind-up never lands its strike or charges the gauge.
        assert_eq!(strikes(&owner), 0);
        assert_eq!(owner.gauge.value(), 0.0);

        owner.actions.clear();
        machine.tick(&mut owner);
        assert!(owner.velocity.x < 0.0, "dash must head away from the target");

        // The dodge runs its course, and the next swing starts fresh.
        let mut ticks = 0;
        while machine.current() == BossState::Evade && ticks < 20 {
            owner.actions.clear();
            machine.tick(&mut owner);
            ticks += 1;
        }
        assert_eq!(machine.current(), BossState::Chasing);
    }

    #[test]
    fn slain_boss_locks_into_die() {
        let mut owner = boss_ctx();
        let mut machine = enter_attack(&mut owner);

        owner.is_dead = true;
        owner.actions.clear();
        machine.tick(&mut owner);
        assert_eq!(machine.current(), BossState::Die);
        assert!(owner
            .actions
            .iter()
            .any(|a| matches!(a, UnitAction::RequestDespawn { .. })));

        // Terminal: nothing transitions out, death effects fire once.
        for _ in 0..10 {
            owner.actions.clear();
            machine.tick(&mut owner);
            assert_eq!(machine.current(), BossState::Die);
            assert!(owner.actions.is_empty());
        }
    }
}
