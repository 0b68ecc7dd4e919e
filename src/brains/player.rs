//! Player behavior: Idle, Move, ComboAttack, Die.
//!
//! Attacks are a chained combo driven by normalized animation progress.
//! Each activation of ComboAttack plays the step recorded in
//! `combo_index`; a buffered press inside the step's chain window queues
//! the follow-up, anything else resets the chain to the opener.

use crate::combat::PLAYER_DESPAWN_DELAY_SECS;
use crate::config::ComboStep;
use crate::fsm::{BoxedState, State, StateKey};

use super::ctx::{PlayerCtx, UnitAction};
use super::sequence::ComboSequence;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerState {
    Idle,
    Move,
    ComboAttack,
    Die,
}

impl StateKey for PlayerState {
    const ALL: &'static [Self] = &[
        PlayerState::Idle,
        PlayerState::Move,
        PlayerState::ComboAttack,
        PlayerState::Die,
    ];
}

pub fn player_state_factory(key: PlayerState) -> BoxedState<PlayerState, PlayerCtx> {
    match key {
        PlayerState::Idle => Box::new(IdleState),
        PlayerState::Move => Box::new(MoveState),
        PlayerState::ComboAttack => Box::new(ComboAttackState::new()),
        PlayerState::Die => Box::new(DieState),
    }
}

const MOVE_DEADZONE: f32 = 1e-3;

struct IdleState;

impl State<PlayerState, PlayerCtx> for IdleState {
    fn on_enter(&mut self, owner: &mut PlayerCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));
    }

    fn check_transition(&mut self, owner: &mut PlayerCtx) -> PlayerState {
        if owner.is_dead {
            return PlayerState::Die;
        }
        if owner.attack_buffered {
            return PlayerState::ComboAttack;
        }
        if owner.move_input.length_squared() > MOVE_DEADZONE {
            return PlayerState::Move;
        }
        PlayerState::Idle
    }
}

struct MoveState;

impl State<PlayerState, PlayerCtx> for MoveState {
    fn on_enter(&mut self, owner: &mut PlayerCtx) {
        owner.push(UnitAction::SetMoving(true));
    }

    fn on_update(&mut self, owner: &mut PlayerCtx) {
        let input = owner.move_input.clamp_length_max(1.0);
        owner.velocity = input * owner.stats.move_speed;
    }

    fn check_transition(&mut self, owner: &mut PlayerCtx) -> PlayerState {
        if owner.is_dead {
            return PlayerState::Die;
        }
        if owner.attack_buffered {
            return PlayerState::ComboAttack;
        }
        if owner.move_input.length_squared() <= MOVE_DEADZONE {
            return PlayerState::Idle;
        }
        PlayerState::Move
    }
}

/// Plays one combo step against the attack animation's progress.
struct ComboAttackState {
    seq: Option<ComboSequence>,
    step: Option<ComboStep>,
}

impl ComboAttackState {
    fn new() -> Self {
        Self {
            seq: None,
            step: None,
        }
    }
}

impl State<PlayerState, PlayerCtx> for ComboAttackState {
    fn on_enter(&mut self, owner: &mut PlayerCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));

        // A stale index (reconfigured combo) falls back to the opener.
        let index = if owner.combo_index < owner.archetype.combo.len() {
            owner.combo_index
        } else {
            0
        };
        let step = owner.archetype.combo[index].clone();

        // Entering the state spends the press that triggered it.
        owner.attack_buffered = false;
        owner.push(UnitAction::TriggerAttackAnim {
            secs: step.anim_secs,
        });
        self.seq = Some(ComboSequence::new(
            step.dealing_start,
            step.dealing_end,
            step.combo_transition,
            step.next,
        ));
        self.step = Some(step);
    }

    fn on_update(&mut self, owner: &mut PlayerCtx) {
        let (Some(seq), Some(step)) = (self.seq.as_mut(), self.step.as_ref()) else {
            return;
        };
        let out = seq.tick(owner.anim_progress, owner.attack_buffered);
        if out.consumed_input {
            owner.attack_buffered = false;
        }
        if out.strike {
            owner.push(UnitAction::Strike {
                bonus_damage: step.extra_damage,
            });
        }
    }

    fn check_transition(&mut self, owner: &mut PlayerCtx) -> PlayerState {
        if owner.is_dead {
            return PlayerState::Die;
        }
        match &self.seq {
            Some(seq) if seq.is_finished() => {
                owner.combo_index = seq.next_combo_index();
                if seq.chained() {
                    // The engine never re-enters an equal key, so a chain
                    // re-buffers the press and bounces through Idle; the
                    // next activation plays the queued step.
                    owner.attack_buffered = true;
                }
                PlayerState::Idle
            }
            _ => PlayerState::ComboAttack,
        }
    }

    fn on_exit(&mut self, owner: &mut PlayerCtx) {
        // An interrupted step (death mid-swing) resets the chain.
        if !self.seq.as_ref().is_some_and(|s| s.is_finished()) {
            owner.combo_index = 0;
        }
    }
}

struct DieState;

impl State<PlayerState, PlayerCtx> for DieState {
    fn on_enter(&mut self, owner: &mut PlayerCtx) {
        owner.halt();
        owner.push(UnitAction::SetMoving(false));
        owner.push(UnitAction::DisableCollision);
        owner.push(UnitAction::TriggerDeathAnim);
        owner.push(UnitAction::RequestDespawn {
            delay: PLAYER_DESPAWN_DELAY_SECS,
        });
    }

    fn check_transition(&mut self, _owner: &mut PlayerCtx) -> PlayerState {
        PlayerState::Die
    }
}
