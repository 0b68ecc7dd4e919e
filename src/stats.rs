//! Unit stat store
//!
//! Every unit owns a [`StatSheet`]: a mapping from stat kind to a
//! computed value (base + bonus). Health is special-cased so that the
//! current value always stays inside `[0, HealthMax]`. The sheet never
//! decides death on its own; it reports the post-consume value and the
//! damage resolver turns depletion into the death flag exactly once.

use std::collections::HashMap;

use bevy::prelude::Component;
use serde::{Deserialize, Serialize};

/// Closed set of stat kinds a unit can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Current health points (clamped into `[0, HealthMax]`)
    HealthCur,
    /// Maximum health points
    HealthMax,
    /// Movement speed in units per second
    MoveSpeed,
    /// Damage dealt by one basic strike
    AttackPower,
    /// Attacks per second (drives wind-up/cooldown timing)
    AttackSpeed,
    /// Basic attack reach in units
    AttackRange,
    /// Jump impulse (owned by the movement collaborator, stored here)
    JumpForce,
    /// Evade/dash displacement speed
    DashForce,
    /// Generic cooldown scalar
    Cooldown,
}

/// Which half of a stat a mutation applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifierKind {
    Base,
    Bonus,
}

/// One stored stat: configured base plus runtime bonus.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatValue {
    pub base: f32,
    pub bonus: f32,
}

impl StatValue {
    pub fn total(&self) -> f32 {
        self.base + self.bonus
    }
}

/// Per-unit stat storage. Mutated only through `set`/`add_bonus`/`consume`.
#[derive(Component, Clone, Debug, Default)]
pub struct StatSheet {
    values: HashMap<StatKind, StatValue>,
}

impl StatSheet {
    /// Build a sheet from configured base values.
    ///
    /// Malformed configuration is a fatal setup error: the caller gets an
    /// `Err` and must abort initialization rather than limp into combat.
    pub fn from_config(bases: &HashMap<StatKind, f32>) -> Result<Self, String> {
        let mut values = HashMap::new();

        for (&kind, &base) in bases {
            if base < 0.0 {
                return Err(format!("stat {:?} has negative base value {}", kind, base));
            }
            values.insert(kind, StatValue { base, bonus: 0.0 });
        }

        let max_hp = values
            .get(&StatKind::HealthMax)
            .map(StatValue::total)
            .ok_or_else(|| "stat table is missing HealthMax".to_string())?;
        if max_hp <= 0.0 {
            return Err(format!("HealthMax must be positive, got {}", max_hp));
        }

        if let Some(speed) = values.get(&StatKind::AttackSpeed) {
            if speed.total() <= 0.0 {
                return Err(format!(
                    "AttackSpeed must be positive when configured, got {}",
                    speed.total()
                ));
            }
        }

        // Current health starts at the maximum unless the table says otherwise.
        let cur = values
            .entry(StatKind::HealthCur)
            .or_insert(StatValue { base: max_hp, bonus: 0.0 });
        cur.base = cur.total().min(max_hp) - cur.bonus;

        Ok(Self { values })
    }

    /// Current computed value for `kind`.
    ///
    /// Unconfigured kinds read as 0.0; callers that need a different
    /// default use [`StatSheet::value_or`].
    pub fn value(&self, kind: StatKind) -> f32 {
        self.values.get(&kind).map(StatValue::total).unwrap_or(0.0)
    }

    /// Current value for `kind`, or `fallback` when the kind is unconfigured.
    pub fn value_or(&self, kind: StatKind, fallback: f32) -> f32 {
        self.values.get(&kind).map(StatValue::total).unwrap_or(fallback)
    }

    /// Overwrite one half of a stat.
    pub fn set(&mut self, kind: StatKind, modifier: ModifierKind, value: f32) {
        let entry = self.values.entry(kind).or_default();
        match modifier {
            ModifierKind::Base => entry.base = value,
            ModifierKind::Bonus => entry.bonus = value,
        }
        self.clamp_health(kind);
    }

    /// Add a runtime bonus on top of the configured base.
    pub fn add_bonus(&mut self, kind: StatKind, amount: f32) {
        self.values.entry(kind).or_default().bonus += amount;
        self.clamp_health(kind);
    }

    /// Subtract `amount` from a stat and return the new computed value.
    ///
    /// This is the damage path: `consume(HealthCur, Base, damage)` clamps
    /// into `[0, HealthMax]` and the returned value tells the resolver
    /// whether the hit was lethal.
    pub fn consume(&mut self, kind: StatKind, modifier: ModifierKind, amount: f32) -> f32 {
        debug_assert!(amount >= 0.0, "consume amount cannot be negative, got {}", amount);

        let entry = self.values.entry(kind).or_default();
        match modifier {
            ModifierKind::Base => entry.base -= amount,
            ModifierKind::Bonus => entry.bonus -= amount,
        }
        self.clamp_health(kind);
        self.value(kind)
    }

    /// Current health as a fraction of maximum, in `[0, 1]`.
    pub fn hp_ratio(&self) -> f32 {
        let max = self.value(StatKind::HealthMax);
        if max <= 0.0 {
            return 0.0;
        }
        self.value(StatKind::HealthCur) / max
    }

    fn clamp_health(&mut self, kind: StatKind) {
        if kind != StatKind::HealthCur {
            return;
        }
        let max = self.value(StatKind::HealthMax);
        if let Some(entry) = self.values.get_mut(&StatKind::HealthCur) {
            let clamped = entry.total().clamp(0.0, max);
            entry.base = clamped - entry.bonus;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(pairs: &[(StatKind, f32)]) -> StatSheet {
        let bases: HashMap<StatKind, f32> = pairs.iter().copied().collect();
        StatSheet::from_config(&bases).expect("valid test config")
    }

    #[test]
    fn current_health_defaults_to_max() {
        let s = sheet(&[(StatKind::HealthMax, 100.0)]);
        assert_eq!(s.value(StatKind::HealthCur), 100.0);
    }

    #[test]
    fn unconfigured_kind_reads_as_zero() {
        let s = sheet(&[(StatKind::HealthMax, 100.0)]);
        assert_eq!(s.value(StatKind::DashForce), 0.0);
        assert_eq!(s.value_or(StatKind::DashForce, 7.5), 7.5);
    }

    #[test]
    fn consume_clamps_health_at_zero() {
        let mut s = sheet(&[(StatKind::HealthMax, 100.0)]);
        let after = s.consume(StatKind::HealthCur, ModifierKind::Base, 30.0);
        assert_eq!(after, 70.0);
        let after = s.consume(StatKind::HealthCur, ModifierKind::Base, 80.0);
        assert_eq!(after, 0.0);
        assert_eq!(s.value(StatKind::HealthCur), 0.0);
    }

    #[test]
    fn health_never_exceeds_max() {
        let mut s = sheet(&[(StatKind::HealthMax, 100.0)]);
        s.add_bonus(StatKind::HealthCur, 50.0);
        assert_eq!(s.value(StatKind::HealthCur), 100.0);
    }

    #[test]
    fn hp_ratio_tracks_consumption() {
        let mut s = sheet(&[(StatKind::HealthMax, 200.0)]);
        s.consume(StatKind::HealthCur, ModifierKind::Base, 50.0);
        assert!((s.hp_ratio() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_max_health_is_fatal() {
        let bases: HashMap<StatKind, f32> = [(StatKind::MoveSpeed, 3.0)].into_iter().collect();
        assert!(StatSheet::from_config(&bases).is_err());
    }

    #[test]
    fn zero_attack_speed_is_fatal() {
        let bases: HashMap<StatKind, f32> = [
            (StatKind::HealthMax, 10.0),
            (StatKind::AttackSpeed, 0.0),
        ]
        .into_iter()
        .collect();
        assert!(StatSheet::from_config(&bases).is_err());
    }

    #[test]
    fn negative_base_is_fatal() {
        let bases: HashMap<StatKind, f32> = [
            (StatKind::HealthMax, 10.0),
            (StatKind::MoveSpeed, -1.0),
        ]
        .into_iter()
        .collect();
        assert!(StatSheet::from_config(&bases).is_err());
    }
}
