//! Tick contexts handed to state objects.
//!
//! States never touch the ECS directly. Each tick the driver systems
//! build an owned snapshot of what a unit can see, lend it to the state
//! machine, then write the outputs (velocity, flags, queued actions)
//! back to components. Keeping the context owned keeps boxed states
//! `'static` and storable in components.

use bevy::prelude::*;
use smallvec::SmallVec;
use std::sync::Arc;

use crate::combat::components::{GameRng, PatternGauge};
use crate::config::UnitArchetype;
use crate::stats::{StatKind, StatSheet};

/// Side effects a state wants performed this tick. Applied by the
/// driver system after the machine ticks, in queue order.
#[derive(Debug, Clone)]
pub enum UnitAction {
    /// Land a melee hit on the current target.
    Strike { bonus_damage: f32 },
    /// Launch a projectile toward the current target.
    SpawnProjectile,
    SetMoving(bool),
    TriggerAttackAnim { secs: f32 },
    TriggerDeathAnim,
    DisableCollision,
    RequestDespawn { delay: f32 },
    /// Emit a combat log line.
    Announce {
        kind: crate::combat::log::CombatLogEventType,
        message: String,
    },
}

/// What a unit knows about its current target.
#[derive(Debug, Clone, Copy)]
pub struct TargetView {
    pub entity: Entity,
    pub pos: Vec2,
}

/// Read-only snapshot of the stats a brain consults.
#[derive(Debug, Clone, Copy)]
pub struct StatView {
    pub move_speed: f32,
    pub attack_power: f32,
    pub attack_speed: f32,
    pub attack_range: f32,
    pub dash_force: f32,
    pub health_cur: f32,
    pub health_max: f32,
}

impl StatView {
    pub fn from_sheet(sheet: &StatSheet) -> Self {
        let move_speed = sheet.value(StatKind::MoveSpeed);
        Self {
            move_speed,
            attack_power: sheet.value(StatKind::AttackPower),
            attack_speed: sheet.value_or(StatKind::AttackSpeed, 1.0),
            attack_range: sheet.value(StatKind::AttackRange),
            // Units without a configured dash borrow a burst of speed.
            dash_force: sheet.value_or(StatKind::DashForce, move_speed * 2.5),
            health_cur: sheet.value(StatKind::HealthCur),
            health_max: sheet.value_or(StatKind::HealthMax, 1.0),
        }
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.health_max <= 0.0 {
            0.0
        } else {
            (self.health_cur / self.health_max).clamp(0.0, 1.0)
        }
    }
}

/// Context for monster and boss brains.
pub struct BrainCtx {
    pub dt: f32,
    /// Unit id, as the combat log names it.
    pub id: String,
    pub pos: Vec2,
    pub is_dead: bool,
    /// In-out: set by the damage resolver, cleared when a brain honors it.
    pub evade_requested: bool,
    pub target: Option<TargetView>,
    pub stats: StatView,
    pub archetype: Arc<UnitArchetype>,
    /// In-out: boss charge; zero-capacity default for regular monsters.
    pub gauge: PatternGauge,
    /// The shared combat stream, swapped in for the duration of the tick.
    pub rng: GameRng,
    /// Out: desired velocity, integrated by `apply_movement`.
    pub velocity: Vec2,
    pub actions: SmallVec<[UnitAction; 4]>,
}

impl BrainCtx {
    pub fn push(&mut self, action: UnitAction) {
        self.actions.push(action);
    }

    pub fn distance_to_target(&self) -> Option<f32> {
        self.target.map(|t| self.pos.distance(t.pos))
    }

    pub fn dir_to_target(&self) -> Option<Vec2> {
        self.target
            .map(|t| (t.pos - self.pos).normalize_or_zero())
    }

    pub fn halt(&mut self) {
        self.velocity = Vec2::ZERO;
    }
}

/// Context for the player brain.
pub struct PlayerCtx {
    pub dt: f32,
    pub pos: Vec2,
    pub is_dead: bool,
    pub move_input: Vec2,
    /// In-out: buffered attack press, consumed by combo windows.
    pub attack_buffered: bool,
    /// Normalized progress of the current attack swing.
    pub anim_progress: f32,
    /// In-out: which combo step the next attack starts from.
    pub combo_index: usize,
    pub target: Option<TargetView>,
    pub stats: StatView,
    pub archetype: Arc<UnitArchetype>,
    pub velocity: Vec2,
    pub actions: SmallVec<[UnitAction; 4]>,
}

impl PlayerCtx {
    pub fn push(&mut self, action: UnitAction) {
        self.actions.push(action);
    }

    pub fn halt(&mut self) {
        self.velocity = Vec2::ZERO;
    }
}
