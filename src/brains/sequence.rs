//! Timed attack sequencing.
//!
//! Sequences are owned by the state instance running them, so leaving
//! the state drops the sequence and any pending effect with it. A
//! cancelled wind-up can never land its strike later.

/// Dwell-timed melee swing: wind-up, strike instant, recovery, cooldown.
#[derive(Debug, Clone)]
pub struct AttackSequence {
    phase: Phase,
    remaining: f32,
    recover: f32,
    cooldown: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    WindUp,
    Recover,
    Cooldown,
    Done,
}

impl AttackSequence {
    pub fn new(wind_up: f32, recover: f32, cooldown: f32) -> Self {
        debug_assert!(wind_up > 0.0);
        Self {
            phase: Phase::WindUp,
            remaining: wind_up,
            recover,
            cooldown,
        }
    }

    /// Advance by `dt`. Returns `true` exactly once, on the tick the
    /// wind-up completes and the strike lands. Leftover time carries
    /// into the next phase so fixed-step runs stay exact.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.phase == Phase::Done {
            return false;
        }
        self.remaining -= dt;

        let mut struck = false;
        while self.remaining <= 0.0 && self.phase != Phase::Done {
            let leftover = self.remaining;
            match self.phase {
                Phase::WindUp => {
                    struck = true;
                    self.phase = Phase::Recover;
                    self.remaining = self.recover + leftover;
                }
                Phase::Recover => {
                    self.phase = Phase::Cooldown;
                    self.remaining = self.cooldown + leftover;
                }
                Phase::Cooldown => {
                    self.phase = Phase::Done;
                    self.remaining = 0.0;
                }
                Phase::Done => unreachable!(),
            }
        }
        struck
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}

/// One player combo step, timed against normalized animation progress.
///
/// The strike lands when progress crosses `dealing_start`. Buffered
/// input chains into the configured next step once progress passes both
/// `dealing_end` and `combo_transition`; otherwise the step completes
/// at full progress and the chain resets.
#[derive(Debug, Clone)]
pub struct ComboSequence {
    dealing_start: f32,
    dealing_end: f32,
    combo_transition: f32,
    next: Option<usize>,
    struck: bool,
    chained: bool,
    finished: bool,
}

/// Per-tick output of a combo step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComboTick {
    pub strike: bool,
    /// The buffered attack press was spent on a chain this tick.
    pub consumed_input: bool,
}

impl ComboSequence {
    pub fn new(
        dealing_start: f32,
        dealing_end: f32,
        combo_transition: f32,
        next: Option<usize>,
    ) -> Self {
        Self {
            dealing_start,
            dealing_end,
            combo_transition,
            next,
            struck: false,
            chained: false,
            finished: false,
        }
    }

    pub fn tick(&mut self, progress: f32, input_buffered: bool) -> ComboTick {
        let mut out = ComboTick::default();
        if self.finished {
            return out;
        }

        if !self.struck && progress >= self.dealing_start {
            self.struck = true;
            out.strike = true;
        }

        if !self.chained
            && self.next.is_some()
            && input_buffered
            && progress >= self.dealing_end
            && progress >= self.combo_transition
        {
            self.chained = true;
            out.consumed_input = true;
        }

        if self.chained || progress >= 1.0 {
            self.finished = true;
        }
        out
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn chained(&self) -> bool {
        self.chained
    }

    /// Step the next attack starts from: the configured follow-up when
    /// chained, otherwise back to the opener.
    pub fn next_combo_index(&self) -> usize {
        if self.chained {
            self.next.unwrap_or(0)
        } else {
            0
        }
    }
}
