//! Unit archetype tables loaded from RON at startup.
//!
//! Every spawnable unit (player character, monsters, boss) is described
//! by an archetype entry in `assets/config/units.ron`. Tables are
//! validated once at load; a malformed table is a fatal startup error so
//! a bad data change cannot ship silently.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::stats::{StatKind, StatSheet};

pub const UNIT_CONFIG_PATH: &str = "assets/config/units.ron";

/// What kind of brain a unit runs and which side it fights for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum UnitRole {
    Player,
    MeleeMonster,
    RangedMonster,
    Boss,
}

impl UnitRole {
    pub fn is_hostile(self) -> bool {
        !matches!(self, UnitRole::Player)
    }

    pub fn is_boss(self) -> bool {
        matches!(self, UnitRole::Boss)
    }
}

/// One step of the player's chained attack.
///
/// The timing fields are normalized animation progress in `[0, 1]`:
/// the strike lands at `dealing_start`, buffered input may chain to
/// `next` once progress passes both `dealing_end` and
/// `combo_transition`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComboStep {
    pub name: String,
    #[serde(default)]
    pub extra_damage: f32,
    /// Index of the follow-up step, if this one can chain.
    #[serde(default)]
    pub next: Option<usize>,
    pub dealing_start: f32,
    pub dealing_end: f32,
    pub combo_transition: f32,
    /// Wall-clock length of the swing animation in seconds.
    pub anim_secs: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitArchetype {
    pub name: String,
    pub role: UnitRole,
    pub stats: HashMap<StatKind, f32>,
    /// How far this unit notices a target from. Unused by the player.
    #[serde(default)]
    pub detection_range: f32,
    /// Chance in `[0, 1]` to negate an incoming hit entirely.
    #[serde(default)]
    pub parry_chance: f32,
    /// Post-recovery delay before the boss may swing again.
    #[serde(default)]
    pub attack_cooldown: f32,
    /// Ranged only: closer than this, the unit backs away.
    #[serde(default)]
    pub min_attack_distance: f32,
    #[serde(default)]
    pub projectile_speed: f32,
    /// Boss only: occupation time of each pattern tier, indexed by tier.
    #[serde(default)]
    pub pattern_delays: Vec<f32>,
    #[serde(default)]
    pub gauge_max: f32,
    #[serde(default)]
    pub gauge_per_attack: f32,
    /// Player only: the attack chain, in step order.
    #[serde(default)]
    pub combo: Vec<ComboStep>,
}

impl UnitArchetype {
    fn validate(&self, id: &str) -> Result<(), String> {
        let err = |msg: String| Err(format!("unit '{}': {}", id, msg));

        // Stat maps share the sheet's own validation rules.
        if let Err(e) = StatSheet::from_config(&self.stats) {
            return err(e);
        }
        if !(0.0..=1.0).contains(&self.parry_chance) {
            return err(format!("parry_chance {} outside [0, 1]", self.parry_chance));
        }

        if self.role != UnitRole::Player {
            for kind in [
                StatKind::MoveSpeed,
                StatKind::AttackPower,
                StatKind::AttackSpeed,
                StatKind::AttackRange,
            ] {
                if !self.stats.contains_key(&kind) {
                    return err(format!("missing required stat {:?}", kind));
                }
            }
            if self.detection_range <= 0.0 {
                return err("detection_range must be positive".to_string());
            }
        }

        match self.role {
            UnitRole::Player => {
                if self.combo.is_empty() {
                    return err("player archetype needs at least one combo step".to_string());
                }
                for (i, step) in self.combo.iter().enumerate() {
                    step.validate().map_err(|e| {
                        format!("unit '{}': combo step {} ('{}'): {}", id, i, step.name, e)
                    })?;
                    if let Some(next) = step.next {
                        if next >= self.combo.len() {
                            return err(format!(
                                "combo step {} chains to missing step {}",
                                i, next
                            ));
                        }
                    }
                }
            }
            UnitRole::RangedMonster => {
                if self.min_attack_distance <= 0.0 {
                    return err("ranged unit needs a positive min_attack_distance".to_string());
                }
                if self.projectile_speed <= 0.0 {
                    return err("ranged unit needs a positive projectile_speed".to_string());
                }
            }
            UnitRole::Boss => {
                if self.pattern_delays.len() != 3 {
                    return err(format!(
                        "boss needs exactly 3 pattern_delays, found {}",
                        self.pattern_delays.len()
                    ));
                }
                if self.pattern_delays.iter().any(|d| *d <= 0.0) {
                    return err("pattern_delays must all be positive".to_string());
                }
                if self.gauge_max <= 0.0 || self.gauge_per_attack <= 0.0 {
                    return err("boss needs positive gauge_max and gauge_per_attack".to_string());
                }
                if self.attack_cooldown <= 0.0 {
                    return err("boss needs a positive attack_cooldown".to_string());
                }
            }
            UnitRole::MeleeMonster => {}
        }

        Ok(())
    }
}

impl ComboStep {
    fn validate(&self) -> Result<(), String> {
        for (label, v) in [
            ("dealing_start", self.dealing_start),
            ("dealing_end", self.dealing_end),
            ("combo_transition", self.combo_transition),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(format!("{} {} outside [0, 1]", label, v));
            }
        }
        if self.dealing_start > self.dealing_end {
            return Err(format!(
                "dealing_start {} after dealing_end {}",
                self.dealing_start, self.dealing_end
            ));
        }
        if self.anim_secs <= 0.0 {
            return Err(format!("anim_secs {} must be positive", self.anim_secs));
        }
        if self.extra_damage < 0.0 {
            return Err(format!("extra_damage {} must not be negative", self.extra_damage));
        }
        Ok(())
    }
}

/// On-disk shape of the table file.
#[derive(Debug, Serialize, Deserialize)]
struct UnitTable {
    units: HashMap<String, UnitArchetype>,
}

/// Validated archetype table, shared by reference with spawned units.
#[derive(Resource, Clone, Default, Debug)]
pub struct UnitDefs {
    defs: HashMap<String, Arc<UnitArchetype>>,
}

impl UnitDefs {
    pub fn get(&self, id: &str) -> Option<&Arc<UnitArchetype>> {
        self.defs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

pub fn load_unit_defs() -> Result<UnitDefs, String> {
    load_unit_defs_from(UNIT_CONFIG_PATH)
}

pub fn load_unit_defs_from<P: AsRef<Path>>(path: P) -> Result<UnitDefs, String> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    parse_unit_defs(&raw)
}

pub fn parse_unit_defs(raw: &str) -> Result<UnitDefs, String> {
    let table: UnitTable =
        ron::from_str(raw).map_err(|e| format!("failed to parse unit table: {}", e))?;

    if table.units.is_empty() {
        return Err("unit table is empty".to_string());
    }
    for (id, archetype) in &table.units {
        archetype.validate(id)?;
    }

    let defs = table
        .units
        .into_iter()
        .map(|(id, archetype)| (id, Arc::new(archetype)))
        .collect();
    Ok(UnitDefs { defs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grunt_entry() -> &'static str {
        r#"
        "grunt": (
            name: "Grunt",
            role: MeleeMonster,
            stats: {
                HealthMax: 30.0,
                MoveSpeed: 3.0,
                AttackPower: 5.0,
                AttackSpeed: 1.0,
                AttackRange: 1.2,
            },
            detection_range: 8.0,
        ),
        "#
    }

    fn table(entries: &str) -> String {
        format!("(units: {{ {} }})", entries)
    }

    #[test]
    fn minimal_table_parses() {
        let defs = parse_unit_defs(&table(grunt_entry())).unwrap();
        let grunt = defs.get("grunt").unwrap();
        assert_eq!(grunt.role, UnitRole::MeleeMonster);
        assert_eq!(grunt.stats[&StatKind::HealthMax], 30.0);
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = parse_unit_defs("(units: {})").unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn monster_missing_attack_stat_is_rejected() {
        let raw = table(
            r#""grunt": (
                name: "Grunt",
                role: MeleeMonster,
                stats: { HealthMax: 30.0, MoveSpeed: 3.0, AttackSpeed: 1.0, AttackRange: 1.2 },
                detection_range: 8.0,
            ),"#,
        );
        let err = parse_unit_defs(&raw).unwrap_err();
        assert!(err.contains("AttackPower"), "unexpected error: {}", err);
    }

    #[test]
    fn boss_needs_three_pattern_delays() {
        let raw = table(
            r#""warden": (
                name: "Warden",
                role: Boss,
                stats: {
                    HealthMax: 100.0,
                    MoveSpeed: 2.5,
                    AttackPower: 8.0,
                    AttackSpeed: 1.0,
                    AttackRange: 1.5,
                },
                detection_range: 20.0,
                attack_cooldown: 1.0,
                pattern_delays: [2.0, 2.5],
                gauge_max: 100.0,
                gauge_per_attack: 35.0,
            ),"#,
        );
        let err = parse_unit_defs(&raw).unwrap_err();
        assert!(err.contains("pattern_delays"), "unexpected error: {}", err);
    }

    #[test]
    fn combo_chain_must_stay_in_bounds() {
        let raw = table(
            r#""hero": (
                name: "Hero",
                role: Player,
                stats: { HealthMax: 100.0, MoveSpeed: 5.0, AttackPower: 10.0, AttackSpeed: 1.0, AttackRange: 1.5 },
                parry_chance: 0.1,
                combo: [
                    (
                        name: "slash",
                        next: Some(3),
                        dealing_start: 0.3,
                        dealing_end: 0.5,
                        combo_transition: 0.6,
                        anim_secs: 0.6,
                    ),
                ],
            ),"#,
        );
        let err = parse_unit_defs(&raw).unwrap_err();
        assert!(err.contains("missing step 3"), "unexpected error: {}", err);
    }

    #[test]
    fn combo_timing_window_must_be_ordered() {
        let raw = table(
            r#""hero": (
                name: "Hero",
                role: Player,
                stats: { HealthMax: 100.0, MoveSpeed: 5.0, AttackPower: 10.0, AttackSpeed: 1.0, AttackRange: 1.5 },
                combo: [
                    (
                        name: "slash",
                        dealing_start: 0.7,
                        dealing_end: 0.5,
                        combo_transition: 0.6,
                        anim_secs: 0.6,
                    ),
                ],
            ),"#,
        );
        let err = parse_unit_defs(&raw).unwrap_err();
        assert!(err.contains("dealing_start"), "unexpected error: {}", err);
    }

    #[test]
    fn parry_chance_outside_unit_interval_is_rejected() {
        let raw = table(
            r#""grunt": (
                name: "Grunt",
                role: MeleeMonster,
                stats: { HealthMax: 30.0, MoveSpeed: 3.0, AttackPower: 5.0, AttackSpeed: 1.0, AttackRange: 1.2 },
                detection_range: 8.0,
                parry_chance: 1.5,
            ),"#,
        );
        let err = parse_unit_defs(&raw).unwrap_err();
        assert!(err.contains("parry_chance"), "unexpected error: {}", err);
    }

    #[test]
    fn shipped_table_is_valid() {
        let defs = load_unit_defs().expect("shipped unit table must validate");
        assert!(defs.contains("swordsman"));
        assert!(defs.contains("grunt"));
        assert!(defs.contains("archer"));
        assert!(defs.contains("warden"));
    }
}
